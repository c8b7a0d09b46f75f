//! Debounced input channels and the canonical query state.
//!
//! Search and date input are shown immediately but reach the query state only
//! after their quiescence window. Every other change commits at once. Each
//! commit is mirrored into the external state store, and the echo of our own
//! write is recognized and ignored when it comes back.

use crate::Debouncer;
use std::sync::Arc;
use std::time::Duration;
use tabula_core::{DateRange, QueryState, SortOrder, UrlState};
use tabula_error::ValidationError;
use tabula_interface::StateStore;
use tracing::{debug, instrument, trace};

/// Generation counter identifying one scheduled commit.
pub type Ticket = u64;

/// Lifecycle of a debounced input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState<V> {
    /// Nothing typed since the last reset
    Idle,
    /// Waiting for the quiescence window; only `ticket` may commit `value`
    Pending {
        /// Generation allowed to commit
        ticket: Ticket,
        /// Value to commit
        value: V,
    },
    /// The value of `ticket` reached the query state
    Committed {
        /// Generation that committed
        ticket: Ticket,
    },
}

/// One debounced input: its state machine plus its timer.
#[derive(Debug)]
pub struct InputChannel<V> {
    state: ChannelState<V>,
    next_ticket: Ticket,
    window: Duration,
    timer: Debouncer,
}

impl<V: Clone> InputChannel<V> {
    /// Idle channel with the given quiescence window.
    pub fn new(window: Duration) -> Self {
        Self {
            state: ChannelState::Idle,
            next_ticket: 0,
            window,
            timer: Debouncer::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> &ChannelState<V> {
        &self.state
    }

    /// Quiescence window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether a value is waiting to commit.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, ChannelState::Pending { .. })
    }

    /// Replaces any pending value and restarts the timer.
    ///
    /// `on_elapsed` receives the ticket of this generation and is expected to
    /// call back into [`InputChannel::take`].
    pub fn schedule<F>(&mut self, value: V, on_elapsed: F) -> Ticket
    where
        F: FnOnce(Ticket) + Send + 'static,
    {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.state = ChannelState::Pending { ticket, value };
        self.timer.schedule(self.window, move || on_elapsed(ticket));
        ticket
    }

    /// Takes the pending value if `ticket` is still the current generation.
    pub fn take(&mut self, ticket: Ticket) -> Option<V> {
        match &self.state {
            ChannelState::Pending { ticket: current, value } if *current == ticket => {
                let value = value.clone();
                self.state = ChannelState::Committed { ticket };
                Some(value)
            }
            _ => {
                trace!(ticket, "Superseded commit ignored");
                None
            }
        }
    }

    /// Drops the pending value and aborts the timer.
    pub fn cancel(&mut self) {
        self.timer.cancel();
        if self.is_pending() {
            self.state = ChannelState::Idle;
        }
    }

    /// Returns to idle, forgetting any committed generation.
    pub fn reset(&mut self) {
        self.timer.cancel();
        self.state = ChannelState::Idle;
    }
}

/// What happened to a date range handed to [`QuerySynchronizer::set_date_range`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateChange {
    /// Cleared range committed at once; carries the new state if it changed
    Committed(Option<QueryState>),
    /// Complete range waiting for the quiescence window
    Scheduled(Ticket),
    /// Only one bound chosen; displayed but not committed
    Incomplete,
}

/// Owns the canonical [`QueryState`] and keeps the external store in step.
pub struct QuerySynchronizer {
    defaults: QueryState,
    query: QueryState,
    search_input: String,
    date_input: DateRange,
    search: InputChannel<String>,
    dates: InputChannel<DateRange>,
    external: Option<Arc<dyn StateStore>>,
    last_written: Option<UrlState>,
    suppress_echo: bool,
}

impl std::fmt::Debug for QuerySynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySynchronizer")
            .field("query", &self.query)
            .field("search_input", &self.search_input)
            .field("date_input", &self.date_input)
            .field("search", &self.search.state)
            .field("dates", &self.dates.state)
            .field("external", &self.external.is_some())
            .field("suppress_echo", &self.suppress_echo)
            .finish()
    }
}

impl QuerySynchronizer {
    /// Creates a synchronizer seeded from `external` when present.
    ///
    /// Malformed external entries fall back to `defaults` and are returned.
    #[instrument(skip_all)]
    pub fn new(
        defaults: QueryState,
        search_window: Duration,
        date_window: Duration,
        external: Option<Arc<dyn StateStore>>,
    ) -> (Self, Vec<ValidationError>) {
        let (query, rejected) = match &external {
            Some(store) => {
                let decoded = store.read().decode(&defaults);
                (decoded.query, decoded.rejected)
            }
            None => (defaults.clone(), Vec::new()),
        };
        debug!(?query, rejected = rejected.len(), "Seeded query state");

        let sync = Self {
            search_input: query.search().clone(),
            date_input: query.date_range().unwrap_or_default(),
            defaults,
            query,
            search: InputChannel::new(search_window),
            dates: InputChannel::new(date_window),
            external,
            last_written: None,
            suppress_echo: false,
        };
        (sync, rejected)
    }

    /// Committed query state.
    pub fn query(&self) -> &QueryState {
        &self.query
    }

    /// State the table starts from and resets to.
    pub fn defaults(&self) -> &QueryState {
        &self.defaults
    }

    /// Search text as displayed, possibly ahead of the committed state.
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// Date range as displayed, possibly ahead of the committed state.
    pub fn date_input(&self) -> DateRange {
        self.date_input
    }

    /// Search channel.
    pub fn search_channel(&self) -> &InputChannel<String> {
        &self.search
    }

    /// Date channel.
    pub fn date_channel(&self) -> &InputChannel<DateRange> {
        &self.dates
    }

    /// Whether any debounced input has not committed yet.
    pub fn has_pending_input(&self) -> bool {
        self.search.is_pending() || self.dates.is_pending()
    }

    /// Shows `value` and schedules its commit.
    pub fn set_search<F>(&mut self, value: impl Into<String>, on_elapsed: F) -> Ticket
    where
        F: FnOnce(Ticket) + Send + 'static,
    {
        let value = value.into();
        self.search_input = value.clone();
        self.search.schedule(value, on_elapsed)
    }

    /// Commits the search of `ticket`, resetting to page 1.
    ///
    /// Returns the new state when the committed query changed.
    pub fn commit_search(&mut self, ticket: Ticket) -> Option<QueryState> {
        let value = self.search.take(ticket)?;
        let next = self.query.clone().with_search(value).with_page(1);
        self.replace(next)
    }

    /// Shows `range` and decides whether and when it commits.
    ///
    /// A cleared range commits at once, a complete one after the date window,
    /// and a one-sided range not at all.
    pub fn set_date_range<F>(&mut self, range: DateRange, on_elapsed: F) -> DateChange
    where
        F: FnOnce(Ticket) + Send + 'static,
    {
        self.date_input = range;
        if range.is_cleared() {
            self.dates.cancel();
            let next = self.query.clone().with_date_range(None).with_page(1);
            DateChange::Committed(self.replace(next))
        } else if range.is_complete() {
            DateChange::Scheduled(self.dates.schedule(range, on_elapsed))
        } else {
            self.dates.cancel();
            DateChange::Incomplete
        }
    }

    /// Commits the date range of `ticket`, resetting to page 1.
    pub fn commit_date_range(&mut self, ticket: Ticket) -> Option<QueryState> {
        let range = self.dates.take(ticket)?;
        let next = self.query.clone().with_date_range(Some(range)).with_page(1);
        self.replace(next)
    }

    /// Moves to `page`.
    pub fn set_page(&mut self, page: u32) -> Option<QueryState> {
        let next = self.query.clone().with_page(page);
        self.replace(next)
    }

    /// Changes the page size and returns to page 1.
    pub fn set_page_size(&mut self, page_size: u32) -> Option<QueryState> {
        let next = self.query.clone().with_page_size(page_size).with_page(1);
        self.replace(next)
    }

    /// Changes the sort and returns to page 1.
    pub fn set_sort(&mut self, sort_by: Option<String>, sort_order: SortOrder) -> Option<QueryState> {
        let next = self.query.clone().with_sort(sort_by, sort_order).with_page(1);
        self.replace(next)
    }

    /// Sets or clears a column filter and returns to page 1.
    pub fn set_column_filter(
        &mut self,
        column: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<QueryState> {
        let next = self.query.clone().with_filter(column, value).with_page(1);
        self.replace(next)
    }

    /// Returns every input to its default and cancels pending commits.
    ///
    /// Managed keys left in the external state are cleared even when the
    /// query is already at its defaults. Idempotent: a second call changes
    /// nothing and writes nothing.
    #[instrument(skip(self))]
    pub fn reset(&mut self) -> Option<QueryState> {
        self.search.reset();
        self.dates.reset();
        self.search_input.clear();
        self.date_input = DateRange::cleared();
        let next = self.defaults.clone();
        let changed = self.replace(next);
        if changed.is_none() {
            self.write_external();
        }
        changed
    }

    /// Applies a state that arrived from outside (navigation, pasted link).
    ///
    /// The echo of our own last write is ignored. A field whose input is
    /// still pending keeps the local value.
    #[instrument(skip(self, state), fields(query = %state.to_query_string()))]
    pub fn apply_external(&mut self, state: &UrlState) -> Option<QueryState> {
        if self.suppress_echo && self.last_written.as_ref() == Some(state) {
            self.suppress_echo = false;
            debug!("Ignoring echo of our own write");
            return None;
        }
        self.suppress_echo = false;

        let mut next = state.decode(&self.defaults).query;
        if self.search.is_pending() {
            next = next.with_search(self.query.search());
        } else {
            self.search_input = next.search().clone();
        }
        if self.dates.is_pending() {
            next = next.with_date_range(*self.query.date_range());
        } else {
            self.date_input = next.date_range().unwrap_or_default();
        }

        if next == self.query {
            return None;
        }
        debug!(?next, "External state changed the query");
        self.query = next.clone();
        Some(next)
    }

    /// Aborts both timers.
    pub fn teardown(&mut self) {
        self.search.cancel();
        self.dates.cancel();
    }

    fn replace(&mut self, next: QueryState) -> Option<QueryState> {
        if next == self.query {
            trace!("Query unchanged");
            return None;
        }
        self.query = next.clone();
        self.write_external();
        Some(next)
    }

    fn write_external(&mut self) {
        let Some(store) = &self.external else {
            return;
        };
        let current = store.read();
        let next = current.merged_with(&self.query, &self.defaults);
        if next == current {
            return;
        }
        trace!(query = %next.to_query_string(), "Writing external state");
        store.write(next.clone());
        self.last_written = Some(next);
        self.suppress_echo = true;
    }
}
