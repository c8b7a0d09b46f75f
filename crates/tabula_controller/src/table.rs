//! The remote table controller.
//!
//! [`RemoteTable`] owns one table instance: its query state, its fetches,
//! its selection and its column layout. Every action takes `&self`, updates
//! state under a short lock and publishes a fresh [`TableSnapshot`]. Timers
//! and fetches run as Tokio tasks that hold only a weak reference, so
//! dropping the table tears everything down.

use crate::{
    AllMatchingRows, ColumnViewManager, Completion, DateChange, FetchOrchestrator, LoadStatus,
    QuerySynchronizer, SelectedRows, SelectionManager, SelectionSet, SelectionTarget,
    TableBody, TableCapabilities, TableConfig, TableRow, Ticket,
};
use derive_getters::Getters;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::{Arc, Weak};
use tabula_core::{ColumnLayout, DateRange, Page, QueryState, RowKey, SortOrder, UrlState};
use tabula_error::{ExportError, ExportErrorKind, FetchError, TabulaResult, ValidationError};
use tabula_interface::{ExportFormat, ExportJob, ExportScope};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Everything a view needs to render the table at one instant.
#[derive(Debug, Clone, Getters)]
pub struct TableSnapshot<T> {
    /// Committed query state
    query: QueryState,
    /// Search text as displayed
    search_input: String,
    /// Date range as displayed
    date_input: DateRange,
    /// Whether a debounced input has not committed yet
    pending_input: bool,
    /// Load status
    status: LoadStatus,
    /// Body to render
    body: TableBody<T>,
    /// Rows matching the last applied query
    total: u64,
    /// Pages at the current page size
    page_count: u64,
    /// Selected row count
    selected: u64,
    /// Whether every matching row is selected
    all_matching: bool,
    /// Column overrides
    columns: ColumnLayout,
    /// Whether any filter is active
    is_filtered: bool,
    /// Whether the table is still mounted
    mounted: bool,
}

impl<T> TableSnapshot<T> {
    /// Whether no input is pending and no fetch is in flight.
    pub fn is_settled(&self) -> bool {
        !self.pending_input && self.status != LoadStatus::Loading
    }

    /// Rows currently displayed, empty unless the body holds a page.
    pub fn rows(&self) -> &[T] {
        match &self.body {
            TableBody::Rows { snapshot, .. } => snapshot.page.rows(),
            _ => &[],
        }
    }
}

struct TableCore<T> {
    sync: QuerySynchronizer,
    fetch: FetchOrchestrator<T>,
    selection: SelectionManager<T>,
    columns: ColumnViewManager,
    mounted: bool,
}

impl<T: TableRow> TableCore<T> {
    fn capture(&self) -> TableSnapshot<T> {
        let query = self.sync.query().clone();
        let total = self.fetch.total();
        TableSnapshot {
            search_input: self.sync.search_input().to_string(),
            date_input: self.sync.date_input(),
            pending_input: self.sync.has_pending_input(),
            status: self.fetch.status().clone(),
            body: self.fetch.body(),
            total,
            page_count: total.div_ceil(u64::from(*query.page_size())),
            selected: self.selection.set().count(total),
            all_matching: self.selection.set().is_all_matching(),
            columns: self.columns.layout().clone(),
            is_filtered: query.is_filtered(),
            mounted: self.mounted,
            query,
        }
    }
}

struct Shared<T: TableRow> {
    config: TableConfig,
    caps: TableCapabilities<T>,
    rejected: Vec<ValidationError>,
    core: Mutex<TableCore<T>>,
    snapshots: watch::Sender<TableSnapshot<T>>,
}

impl<T: TableRow> Shared<T> {
    fn publish(&self, core: &TableCore<T>) {
        self.snapshots.send_replace(core.capture());
    }

    fn query_changed(self: &Arc<Self>, core: &mut TableCore<T>, query: QueryState) {
        core.selection.set_mut().sync_filter(&query.filter_key());
        self.start_fetch(core, query);
    }

    fn start_fetch(self: &Arc<Self>, core: &mut TableCore<T>, query: QueryState) {
        let Some(ticket) = core.fetch.begin(query) else {
            return;
        };
        let seq = ticket.seq;
        let weak = Arc::downgrade(self);
        let source = Arc::clone(self.caps.source());
        let handle = tokio::spawn(async move {
            let result = source.fetch_page(&ticket.request).await;
            if let Some(shared) = weak.upgrade() {
                shared.finish_fetch(seq, result);
            }
        });
        core.fetch.attach(seq, handle.abort_handle());
    }

    fn finish_fetch(&self, seq: u64, result: Result<Page<T>, FetchError>) {
        let mut guard = self.core.lock();
        let core = &mut *guard;
        if core.fetch.complete(seq, result) == Completion::Applied {
            if let Some(snapshot) = core.fetch.current() {
                core.selection.remember(snapshot);
            }
        }
        self.publish(core);
    }

    fn search_elapsed(self: &Arc<Self>, ticket: Ticket) {
        let mut core = self.core.lock();
        if let Some(query) = core.sync.commit_search(ticket) {
            debug!(search = %query.search(), "Search committed");
            self.query_changed(&mut core, query);
        }
        self.publish(&core);
    }

    fn dates_elapsed(self: &Arc<Self>, ticket: Ticket) {
        let mut core = self.core.lock();
        if let Some(query) = core.sync.commit_date_range(ticket) {
            debug!(range = ?query.date_range(), "Date range committed");
            self.query_changed(&mut core, query);
        }
        self.publish(&core);
    }

    fn on_elapsed(
        weak: Weak<Self>,
        commit: fn(&Arc<Self>, Ticket),
    ) -> impl FnOnce(Ticket) + Send + 'static {
        move |ticket| {
            if let Some(shared) = weak.upgrade() {
                commit(&shared, ticket);
            }
        }
    }

    fn all_matching(&self, query: QueryState) -> AllMatchingRows<T> {
        AllMatchingRows::new(
            Arc::clone(self.caps.source()),
            self.caps.identity().clone(),
            query,
            *self.config.max_export_size(),
        )
    }
}

/// A mounted remote table.
///
/// Must be created and used inside a Tokio runtime. Dropping it unmounts.
pub struct RemoteTable<T: TableRow> {
    shared: Arc<Shared<T>>,
}

impl<T: TableRow> std::fmt::Debug for RemoteTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTable")
            .field("table_id", self.shared.config.table_id())
            .finish_non_exhaustive()
    }
}

impl<T: TableRow> RemoteTable<T> {
    /// Mounts a table and issues the first fetch.
    ///
    /// The initial query is read from the state store when URL state is
    /// enabled. Malformed entries fall back to defaults and are available
    /// from [`RemoteTable::seed_rejections`].
    #[instrument(skip_all, fields(table_id = %config.table_id()))]
    pub fn mount(config: TableConfig, caps: TableCapabilities<T>) -> TabulaResult<Self> {
        config.validate()?;

        let external = if *config.enable_url_state() {
            caps.state_store().cloned()
        } else {
            None
        };
        let (sync, rejected) = QuerySynchronizer::new(
            config.default_query(),
            config.search_debounce(),
            config.date_debounce(),
            external,
        );
        let core = TableCore {
            sync,
            fetch: FetchOrchestrator::new(
                config.table_id().clone(),
                *config.skeleton_rows(),
                *config.abort_superseded_fetches(),
            ),
            selection: SelectionManager::new(caps.identity().clone(), *config.row_cache_size()),
            columns: ColumnViewManager::load(
                config.table_id().clone(),
                Arc::clone(caps.view_store()),
            ),
            mounted: true,
        };
        let (snapshots, _) = watch::channel(core.capture());
        let shared = Arc::new(Shared {
            config,
            caps,
            rejected,
            core: Mutex::new(core),
            snapshots,
        });

        {
            let mut core = shared.core.lock();
            let query = core.sync.query().clone();
            shared.start_fetch(&mut core, query);
            shared.publish(&core);
        }
        info!("Table mounted");
        Ok(Self { shared })
    }

    fn enabled(&self, flag: bool, feature: &str) -> bool {
        if !flag {
            debug!(feature, "Ignoring input for disabled feature");
        }
        flag
    }

    fn act(&self, action: impl FnOnce(&Arc<Shared<T>>, &mut TableCore<T>)) {
        let shared = &self.shared;
        let mut core = shared.core.lock();
        if !core.mounted {
            debug!("Ignoring action on unmounted table");
            return;
        }
        action(shared, &mut core);
        shared.publish(&core);
    }

    /// Configuration the table was mounted with.
    pub fn config(&self) -> &TableConfig {
        &self.shared.config
    }

    /// External state entries ignored at mount.
    pub fn seed_rejections(&self) -> &[ValidationError] {
        &self.shared.rejected
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> TableSnapshot<T> {
        self.shared.snapshots.borrow().clone()
    }

    /// Receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<TableSnapshot<T>> {
        self.shared.snapshots.subscribe()
    }

    /// Committed query state.
    pub fn query(&self) -> QueryState {
        self.shared.core.lock().sync.query().clone()
    }

    /// Waits until no input is pending and no fetch is in flight.
    pub async fn settled(&self) -> TableSnapshot<T> {
        let mut rx = self.subscribe();
        match rx.wait_for(TableSnapshot::is_settled).await {
            Ok(snapshot) => (*snapshot).clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Shows `value` in the search box and commits it after the search window.
    pub fn set_search(&self, value: impl Into<String>) {
        if !self.enabled(*self.shared.config.enable_search(), "search") {
            return;
        }
        let value = value.into();
        self.act(|shared, core| {
            let on_elapsed = Shared::on_elapsed(Arc::downgrade(shared), Shared::search_elapsed);
            core.sync.set_search(value, on_elapsed);
        });
    }

    /// Shows `range` in the date picker.
    ///
    /// A complete range commits after the date window, a cleared range at
    /// once, and a one-sided range not at all.
    pub fn set_date_range(&self, range: DateRange) {
        if !self.enabled(*self.shared.config.enable_date_filter(), "date_filter") {
            return;
        }
        self.act(|shared, core| {
            let on_elapsed = Shared::on_elapsed(Arc::downgrade(shared), Shared::dates_elapsed);
            if let DateChange::Committed(Some(query)) = core.sync.set_date_range(range, on_elapsed) {
                shared.query_changed(core, query);
            }
        });
    }

    /// Clears the date filter.
    pub fn clear_date_range(&self) {
        self.set_date_range(DateRange::cleared());
    }

    /// Moves to `page`, starting at 1.
    pub fn set_page(&self, page: u32) {
        self.act(|shared, core| {
            if let Some(query) = core.sync.set_page(page) {
                shared.query_changed(core, query);
            }
        });
    }

    /// Moves forward one page if there is one.
    pub fn next_page(&self) {
        let snapshot = self.snapshot();
        let page = *snapshot.query().page();
        if u64::from(page) < *snapshot.page_count() {
            self.set_page(page + 1);
        }
    }

    /// Moves back one page if there is one.
    pub fn previous_page(&self) {
        let page = *self.query().page();
        if page > 1 {
            self.set_page(page - 1);
        }
    }

    /// Changes the page size and returns to page 1.
    pub fn set_page_size(&self, page_size: u32) {
        if !self.shared.config.page_size_options().contains(&page_size) {
            warn!(page_size, "Page size not among the configured options");
        }
        self.act(|shared, core| {
            if let Some(query) = core.sync.set_page_size(page_size) {
                shared.query_changed(core, query);
            }
        });
    }

    /// Sorts by `sort_by` in `order`. `None` removes the sort.
    pub fn set_sort(&self, sort_by: Option<String>, order: SortOrder) {
        self.act(|shared, core| {
            if let Some(query) = core.sync.set_sort(sort_by, order) {
                shared.query_changed(core, query);
            }
        });
    }

    /// Sorts by `column`, flipping the direction if it is already the sort column.
    pub fn toggle_sort(&self, column: &str) {
        let query = self.query();
        let order = if query.sort_by().as_deref() == Some(column) {
            query.sort_order().reversed()
        } else {
            *self.shared.config.default_sort_order()
        };
        self.set_sort(Some(column.to_string()), order);
    }

    /// Sets a column filter. An empty value removes it.
    pub fn set_column_filter(&self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        self.act(|shared, core| {
            if let Some(query) = core.sync.set_column_filter(column, value) {
                shared.query_changed(core, query);
            }
        });
    }

    /// Removes a column filter.
    pub fn clear_column_filter(&self, column: impl Into<String>) {
        self.set_column_filter(column, String::new());
    }

    /// Returns the table to its default state.
    ///
    /// Cancels pending search and date commits, clears every filter, the
    /// sort, the selection and the managed external keys, and applies the
    /// configured [`ResetPolicy`](crate::ResetPolicy) to the column layout.
    /// Idempotent.
    #[instrument(skip(self), fields(table_id = %self.shared.config.table_id()))]
    pub fn reset_all(&self) {
        self.act(|shared, core| {
            core.selection.set_mut().clear();
            let policy = shared.config.reset();
            if *policy.reset_column_visibility() {
                core.columns.reset_visibility();
            }
            if *policy.reset_column_sizing() {
                core.columns.reset_sizing();
            }
            if *policy.reset_column_order() {
                core.columns.reset_order();
            }
            if let Some(query) = core.sync.reset() {
                shared.query_changed(core, query);
            }
        });
    }

    /// Applies state that changed outside the table (navigation, pasted link).
    pub fn apply_external_state(&self, state: &UrlState) {
        if !self.enabled(*self.shared.config.enable_url_state(), "url_state") {
            return;
        }
        self.act(|shared, core| {
            if let Some(query) = core.sync.apply_external(state) {
                shared.query_changed(core, query);
            }
        });
    }

    /// Re-issues the failed request. Also works as a refresh when idle.
    pub fn retry(&self) {
        self.act(|shared, core| {
            if let Some(query) = core.fetch.retry_query() {
                info!("Retrying fetch");
                shared.start_fetch(core, query);
            }
        });
    }

    /// Flips the selection of one row.
    pub fn toggle_row(&self, key: impl Into<RowKey>) {
        if !self.enabled(*self.shared.config.enable_row_selection(), "row_selection") {
            return;
        }
        let key = key.into();
        self.act(|_, core| core.selection.set_mut().toggle(key));
    }

    /// Selects every row on the current page, or deselects them if all are.
    pub fn toggle_all_on_page(&self) {
        if !self.enabled(*self.shared.config.enable_row_selection(), "row_selection") {
            return;
        }
        self.act(|_, core| {
            let keys = match core.fetch.current() {
                Some(snapshot) => core.selection.page_keys(snapshot),
                None => Vec::new(),
            };
            core.selection.set_mut().toggle_all(&keys);
        });
    }

    /// Selects every row matching the current filters, across all pages.
    pub fn select_all_matching_filter(&self) {
        if !self.enabled(*self.shared.config.enable_row_selection(), "row_selection") {
            return;
        }
        self.act(|_, core| {
            let filter = core.sync.query().filter_key();
            core.selection.set_mut().select_all_matching(filter);
        });
    }

    /// Deselects everything.
    pub fn clear_selection(&self) {
        self.act(|_, core| core.selection.set_mut().clear());
    }

    /// Current selection.
    pub fn selection(&self) -> SelectionSet {
        self.shared.core.lock().selection.set().clone()
    }

    /// Keys of the rows on the current page, in display order.
    pub fn page_keys(&self) -> Vec<RowKey> {
        let core = self.shared.core.lock();
        match core.fetch.current() {
            Some(snapshot) => core.selection.page_keys(snapshot),
            None => Vec::new(),
        }
    }

    /// Selected rows.
    ///
    /// Explicit selections come from rows seen on any page. An all-matching
    /// selection returns a deferred accessor that fetches, bounded by
    /// `max_export_size`.
    pub fn get_selected_rows(&self) -> SelectedRows<T> {
        let core = self.shared.core.lock();
        let set = core.selection.set();
        if !set.is_all_matching() {
            return SelectedRows::Materialized(core.selection.materialize());
        }
        let query = core.sync.query().clone();
        let mut rows = self
            .shared
            .all_matching(query.clone())
            .with_excluded(set.excluded().clone());
        if let Some(current) = core.fetch.current() {
            if current.query.filter_key() == query.filter_key() {
                rows = rows.with_known_total(*current.page.total());
            }
        }
        SelectedRows::Deferred(rows)
    }

    /// Exports rows to the configured sink. Returns the number of rows written.
    ///
    /// [`ExportScope::All`] ignores search, date and column filters but keeps
    /// the sort. Every scope fails rather than write a truncated file.
    #[instrument(skip(self), fields(table_id = %self.shared.config.table_id()))]
    pub async fn export_rows(&self, format: ExportFormat, scope: ExportScope) -> TabulaResult<usize> {
        let config = &self.shared.config;
        if !*config.enable_export() {
            return Err(ExportError::new(ExportErrorKind::Disabled(config.table_id().clone())).into());
        }
        let sink = self
            .shared
            .caps
            .export_sink()
            .cloned()
            .ok_or_else(|| ExportError::new(ExportErrorKind::MissingSink))?;

        let rows = match scope {
            ExportScope::Selected => match self.get_selected_rows() {
                SelectedRows::Materialized(rows) => {
                    let requested = rows.len() as u64;
                    if requested > *config.max_export_size() {
                        return Err(ExportError::new(ExportErrorKind::Bounds {
                            requested,
                            limit: *config.max_export_size(),
                        })
                        .into());
                    }
                    rows
                }
                SelectedRows::Deferred(rows) => rows.load().await?,
            },
            ExportScope::Filtered => {
                let query = self.query();
                self.shared.all_matching(query).load().await?
            }
            ExportScope::All => {
                let query = self.query();
                let unfiltered = self
                    .shared
                    .config
                    .default_query()
                    .with_sort(query.sort_by().clone(), *query.sort_order());
                self.shared.all_matching(unfiltered).load().await?
            }
        };

        let options = self.shared.caps.export();
        let records = options.to_records(&rows)?;
        let count = records.len();
        let job = ExportJob::new(
            format,
            scope,
            options.entity_name(),
            options.columns().to_vec(),
            records,
        );
        sink.export(job).await?;
        info!(rows = count, %format, %scope, "Export complete");
        Ok(count)
    }

    /// Runs `action` on the current selection.
    ///
    /// On success the selection is cleared and the current page refetched.
    /// On failure both are left alone and the error is returned.
    pub async fn bulk_action<F, Fut>(&self, action: F) -> TabulaResult<()>
    where
        F: FnOnce(SelectionTarget) -> Fut,
        Fut: Future<Output = TabulaResult<()>>,
    {
        let target = {
            let core = self.shared.core.lock();
            core.selection.set().target(core.sync.query())
        };
        action(target).await?;
        self.act(|shared, core| {
            core.selection.set_mut().clear();
            let query = core.sync.query().clone();
            shared.start_fetch(core, query);
        });
        Ok(())
    }

    /// Sets a column width in pixels.
    pub fn set_column_width(&self, column: &str, px: u32) {
        if !self.enabled(*self.shared.config.enable_column_resizing(), "column_resizing") {
            return;
        }
        self.act(|_, core| core.columns.set_width(column, px));
    }

    /// Shows or hides a column.
    pub fn set_column_visible(&self, column: &str, visible: bool) {
        if !self.enabled(*self.shared.config.enable_column_visibility(), "column_visibility") {
            return;
        }
        self.act(|_, core| core.columns.set_visible(column, visible));
    }

    /// Sets the column display order.
    pub fn set_column_order<S: AsRef<str>>(&self, order: &[S]) {
        self.act(|_, core| core.columns.set_order(order));
    }

    /// Drops width overrides.
    pub fn reset_column_sizing(&self) {
        self.act(|_, core| core.columns.reset_sizing());
    }

    /// Drops order overrides.
    pub fn reset_column_order(&self) {
        self.act(|_, core| core.columns.reset_order());
    }

    /// Shows every column.
    pub fn reset_column_visibility(&self) {
        self.act(|_, core| core.columns.reset_visibility());
    }

    /// Cancels timers and in-flight fetches. Later results are dropped.
    pub fn unmount(&self) {
        let mut core = self.shared.core.lock();
        if !core.mounted {
            return;
        }
        core.mounted = false;
        core.sync.teardown();
        core.fetch.teardown();
        self.shared.publish(&core);
        info!(table_id = %self.shared.config.table_id(), "Table unmounted");
    }
}

impl<T: TableRow> Drop for RemoteTable<T> {
    fn drop(&mut self) {
        self.unmount();
    }
}
