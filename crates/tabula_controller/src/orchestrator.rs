//! Ordered fetches: only the most recent request may change the view.

use std::sync::Arc;
use tabula_core::{FetchOutcome, FetchRequest, Page, QueryState, record_fetch};
use tabula_error::FetchError;
use tabula_interface::DataSource;
use tokio::task::AbortHandle;
use tracing::{debug, error, instrument};

/// Fetches the page described by `query`.
///
/// Equal states always produce equal requests, so calling this twice with the
/// same state is safe.
pub async fn fetch_page<T>(
    source: &dyn DataSource<T>,
    query: &QueryState,
) -> Result<Page<T>, FetchError> {
    source.fetch_page(&FetchRequest::from_query(query)).await
}

/// A failed fetch and the state it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// What went wrong
    pub error: FetchError,
    /// State to re-issue on retry
    pub query: QueryState,
}

impl FetchFailure {
    /// Whether a retry is likely to help.
    pub fn is_retryable(&self) -> bool {
        self.error.is_retryable()
    }
}

/// Load state of the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadStatus {
    /// Showing the latest applied page, nothing in flight
    #[default]
    Idle,
    /// A request is in flight
    Loading,
    /// The latest request failed
    Error(FetchFailure),
}

/// An applied page together with the state that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot<T> {
    /// Rows and total
    pub page: Page<T>,
    /// State the page was fetched for
    pub query: QueryState,
    /// Sequence number of the request
    pub seq: u64,
}

/// What the table body should render.
#[derive(Debug, Clone, PartialEq)]
pub enum TableBody<T> {
    /// Nothing fetched yet; render placeholder rows
    Skeleton {
        /// Placeholder row count
        rows: usize,
    },
    /// A page is available. `stale` is set while a newer request is loading
    /// or after it failed.
    Rows {
        /// The page shown
        snapshot: Arc<PageSnapshot<T>>,
        /// Whether the page belongs to an older query
        stale: bool,
    },
    /// The latest fetch succeeded with no rows
    Empty {
        /// State that matched nothing
        query: QueryState,
    },
    /// The first fetch failed and there is nothing to show
    Failed,
}

/// How a completed fetch was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Result became the current page
    Applied,
    /// Error surfaced to the view
    Failed,
    /// Result was superseded and dropped
    Discarded,
}

/// A request the orchestrator has accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    /// Monotonic sequence number
    pub seq: u64,
    /// Request to send
    pub request: FetchRequest,
}

/// Tags each request with a sequence number and applies only the latest.
#[derive(Debug)]
pub struct FetchOrchestrator<T> {
    table_id: String,
    skeleton_rows: usize,
    abort_superseded: bool,
    latest: u64,
    status: LoadStatus,
    current: Option<Arc<PageSnapshot<T>>>,
    last_query: Option<QueryState>,
    in_flight: Option<AbortHandle>,
    torn_down: bool,
}

impl<T> FetchOrchestrator<T> {
    /// Creates an orchestrator with nothing fetched.
    pub fn new(table_id: impl Into<String>, skeleton_rows: usize, abort_superseded: bool) -> Self {
        Self {
            table_id: table_id.into(),
            skeleton_rows,
            abort_superseded,
            latest: 0,
            status: LoadStatus::Idle,
            current: None,
            last_query: None,
            in_flight: None,
            torn_down: false,
        }
    }

    /// Accepts a request for `query`, superseding any request in flight.
    ///
    /// Returns `None` after teardown.
    #[instrument(skip(self, query), fields(table_id = %self.table_id))]
    pub fn begin(&mut self, query: QueryState) -> Option<FetchTicket> {
        if self.torn_down {
            debug!("Fetch requested after teardown");
            return None;
        }
        if let Some(handle) = self.in_flight.take() {
            if self.abort_superseded {
                handle.abort();
            }
        }
        self.latest += 1;
        let ticket = FetchTicket {
            seq: self.latest,
            request: FetchRequest::from_query(&query),
        };
        debug!(seq = ticket.seq, query = %ticket.request.to_query_string(), "Fetch issued");
        record_fetch(&self.table_id, FetchOutcome::Issued);
        self.last_query = Some(query);
        self.status = LoadStatus::Loading;
        Some(ticket)
    }

    /// Records the task running request `seq` so it can be aborted.
    pub fn attach(&mut self, seq: u64, handle: AbortHandle) {
        if seq == self.latest && !self.torn_down {
            self.in_flight = Some(handle);
        } else if self.abort_superseded {
            handle.abort();
        }
    }

    /// Handles the result of request `seq`.
    #[instrument(skip(self, result), fields(table_id = %self.table_id))]
    pub fn complete(&mut self, seq: u64, result: Result<Page<T>, FetchError>) -> Completion {
        if self.torn_down || seq != self.latest {
            debug!(latest = self.latest, "Discarding superseded result");
            record_fetch(&self.table_id, FetchOutcome::Discarded);
            return Completion::Discarded;
        }
        self.in_flight = None;
        let query = self.last_query.clone().unwrap_or_default();
        match result {
            Ok(page) => {
                debug!(rows = page.len(), total = page.total(), "Page applied");
                record_fetch(&self.table_id, FetchOutcome::Applied);
                self.current = Some(Arc::new(PageSnapshot { page, query, seq }));
                self.status = LoadStatus::Idle;
                Completion::Applied
            }
            Err(err) => {
                error!(error = %err, retryable = err.is_retryable(), "Fetch failed");
                record_fetch(&self.table_id, FetchOutcome::Failed);
                self.status = LoadStatus::Error(FetchFailure { error: err, query });
                Completion::Failed
            }
        }
    }

    /// State to re-issue for a retry or refresh.
    pub fn retry_query(&self) -> Option<QueryState> {
        match &self.status {
            LoadStatus::Error(failure) => Some(failure.query.clone()),
            _ => self.last_query.clone(),
        }
    }

    /// Current load status.
    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Whether a request is in flight.
    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    /// Latest applied page.
    pub fn current(&self) -> Option<&Arc<PageSnapshot<T>>> {
        self.current.as_ref()
    }

    /// Sequence number of the most recent request.
    pub fn latest_seq(&self) -> u64 {
        self.latest
    }

    /// Total matching rows as of the latest applied page.
    pub fn total(&self) -> u64 {
        self.current.as_ref().map_or(0, |s| *s.page.total())
    }

    /// What the body should render right now.
    pub fn body(&self) -> TableBody<T> {
        match (&self.current, &self.status) {
            (None, LoadStatus::Error(_)) => TableBody::Failed,
            (None, _) => TableBody::Skeleton {
                rows: self.skeleton_rows,
            },
            (Some(snapshot), LoadStatus::Idle) if snapshot.page.is_empty() => TableBody::Empty {
                query: snapshot.query.clone(),
            },
            (Some(snapshot), status) => TableBody::Rows {
                snapshot: Arc::clone(snapshot),
                stale: *status != LoadStatus::Idle,
            },
        }
    }

    /// Stops accepting requests and drops whatever is in flight.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        if self.status == LoadStatus::Loading {
            self.status = LoadStatus::Idle;
        }
    }

    /// Whether [`FetchOrchestrator::teardown`] ran.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}
