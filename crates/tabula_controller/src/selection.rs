//! Row selection that survives paging.
//!
//! Selection is a set of row keys, not page positions. Rows seen on any page
//! are remembered in a bounded [`RowCache`] so the selection can be
//! materialized after the user has moved on. "Select all matching" is a flag
//! bound to the filter it was made under, with explicit exclusions.

use crate::{PageSnapshot, RowIdentity, TableRow};
use std::collections::BTreeSet;
use std::sync::Arc;
use tabula_cache::{RowCache, RowCacheConfig};
use tabula_core::{FetchRequest, FilterKey, QueryState, RowKey};
use tabula_error::{ExportError, ExportErrorKind, TabulaResult};
use tabula_interface::DataSource;
use tracing::{debug, instrument, warn};

/// Which rows are selected, independent of the rows themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    keys: BTreeSet<RowKey>,
    all_matching: Option<FilterKey>,
    excluded: BTreeSet<RowKey>,
}

impl SelectionSet {
    /// Empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is selected.
    pub fn is_selected(&self, key: &RowKey) -> bool {
        if self.all_matching.is_some() {
            !self.excluded.contains(key)
        } else {
            self.keys.contains(key)
        }
    }

    /// Flips one row.
    pub fn toggle(&mut self, key: RowKey) {
        if self.all_matching.is_some() {
            if !self.excluded.remove(&key) {
                self.excluded.insert(key);
            }
        } else if !self.keys.remove(&key) {
            self.keys.insert(key);
        }
    }

    /// Selects every key on a page, or deselects them if all already are.
    pub fn toggle_all(&mut self, page_keys: &[RowKey]) {
        if page_keys.is_empty() {
            return;
        }
        let all_selected = page_keys.iter().all(|k| self.is_selected(k));
        for key in page_keys {
            let selected = self.is_selected(key);
            if selected == all_selected {
                self.toggle(key.clone());
            }
        }
    }

    /// Selects every row matching `filter`, across all pages.
    pub fn select_all_matching(&mut self, filter: FilterKey) {
        self.all_matching = Some(filter);
        self.excluded.clear();
    }

    /// Drops the all-matching flag if it was made under a different filter.
    ///
    /// Returns whether the flag was dropped.
    pub fn sync_filter(&mut self, filter: &FilterKey) -> bool {
        match &self.all_matching {
            Some(bound) if bound != filter => {
                debug!("Filter changed, dropping select-all-matching");
                self.all_matching = None;
                self.excluded.clear();
                true
            }
            _ => false,
        }
    }

    /// Deselects everything.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.all_matching = None;
        self.excluded.clear();
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.all_matching.is_none() && self.keys.is_empty()
    }

    /// Whether every matching row is selected.
    pub fn is_all_matching(&self) -> bool {
        self.all_matching.is_some()
    }

    /// Explicitly selected keys.
    pub fn keys(&self) -> &BTreeSet<RowKey> {
        &self.keys
    }

    /// Keys excluded from an all-matching selection.
    pub fn excluded(&self) -> &BTreeSet<RowKey> {
        &self.excluded
    }

    /// Number of selected rows, given how many match the filter.
    pub fn count(&self, total_matching: u64) -> u64 {
        if self.all_matching.is_some() {
            total_matching.saturating_sub(self.excluded.len() as u64)
        } else {
            self.keys.len() as u64
        }
    }

    /// Describes the selection to an action that runs elsewhere.
    pub fn target(&self, query: &QueryState) -> SelectionTarget {
        if self.all_matching.is_some() {
            SelectionTarget::AllMatching {
                request: FetchRequest::from_query(query),
                excluded: self.excluded.iter().cloned().collect(),
            }
        } else {
            SelectionTarget::Keys(self.keys.iter().cloned().collect())
        }
    }
}

/// The selection as handed to a bulk action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionTarget {
    /// These rows
    Keys(Vec<RowKey>),
    /// Every row matching `request`, except `excluded`
    AllMatching {
        /// Filter describing the rows; paging fields are irrelevant
        request: FetchRequest,
        /// Rows the user deselected
        excluded: Vec<RowKey>,
    },
}

/// Selected rows, as returned by `get_selected_rows`.
#[derive(Debug)]
pub enum SelectedRows<T> {
    /// Rows available now from the cache
    Materialized(Vec<T>),
    /// Every matching row; must be fetched
    Deferred(AllMatchingRows<T>),
}

/// Fetches every row matching a query, within an upper bound.
pub struct AllMatchingRows<T> {
    source: Arc<dyn DataSource<T>>,
    identity: RowIdentity<T>,
    query: QueryState,
    excluded: BTreeSet<RowKey>,
    max_rows: u64,
    known_total: Option<u64>,
}

impl<T> std::fmt::Debug for AllMatchingRows<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllMatchingRows")
            .field("query", &self.query)
            .field("excluded", &self.excluded)
            .field("max_rows", &self.max_rows)
            .field("known_total", &self.known_total)
            .finish_non_exhaustive()
    }
}

impl<T: TableRow> AllMatchingRows<T> {
    /// Accessor for every row matching `query`.
    pub fn new(
        source: Arc<dyn DataSource<T>>,
        identity: RowIdentity<T>,
        query: QueryState,
        max_rows: u64,
    ) -> Self {
        Self {
            source,
            identity,
            query,
            excluded: BTreeSet::new(),
            max_rows,
            known_total: None,
        }
    }

    /// Leaves `excluded` out of the result.
    pub fn with_excluded(mut self, excluded: BTreeSet<RowKey>) -> Self {
        self.excluded = excluded;
        self
    }

    /// Uses a total already reported for this query to fail fast.
    pub fn with_known_total(mut self, total: u64) -> Self {
        self.known_total = Some(total);
        self
    }

    /// Query whose matches are fetched.
    pub fn query(&self) -> &QueryState {
        &self.query
    }

    /// Upper bound on fetched rows.
    pub fn max_rows(&self) -> u64 {
        self.max_rows
    }

    /// Fetches the rows.
    ///
    /// Fails with a bounds error rather than returning a truncated set.
    #[instrument(skip(self), fields(max_rows = self.max_rows))]
    pub async fn load(&self) -> TabulaResult<Vec<T>> {
        if let Some(total) = self.known_total {
            self.check_bounds(total)?;
        }

        let wanted = self.max_rows.saturating_add(self.excluded.len() as u64);
        let limit = u32::try_from(wanted).unwrap_or(u32::MAX);
        let request = FetchRequest::all_matching(&self.query, limit);
        let page = self.source.fetch_page(&request).await?;
        let total = *page.total();
        self.check_bounds(total)?;

        let received = page.len() as u64;
        if received < total {
            warn!(received, total, "Data source returned a partial result set");
            return Err(ExportError::new(ExportErrorKind::Incomplete {
                received,
                expected: total,
            })
            .into());
        }

        let rows: Vec<T> = page
            .into_rows()
            .into_iter()
            .enumerate()
            .filter(|(index, row)| {
                !self
                    .excluded
                    .contains(&self.identity.key_for(row, *index as u64))
            })
            .map(|(_, row)| row)
            .collect();
        debug!(rows = rows.len(), "Loaded all matching rows");
        Ok(rows)
    }

    fn check_bounds(&self, total: u64) -> Result<(), ExportError> {
        let requested = total.saturating_sub(self.excluded.len() as u64);
        if requested > self.max_rows {
            warn!(requested, limit = self.max_rows, "Row set exceeds export bound");
            return Err(ExportError::new(ExportErrorKind::Bounds {
                requested,
                limit: self.max_rows,
            }));
        }
        Ok(())
    }
}

/// Selection plus the rows needed to materialize it.
#[derive(Debug)]
pub struct SelectionManager<T> {
    set: SelectionSet,
    rows: RowCache<T>,
    identity: RowIdentity<T>,
}

impl<T: TableRow> SelectionManager<T> {
    /// Empty selection remembering up to `cache_size` rows.
    pub fn new(identity: RowIdentity<T>, cache_size: usize) -> Self {
        Self {
            set: SelectionSet::new(),
            rows: RowCache::new(RowCacheConfig::default().with_max_size(cache_size)),
            identity,
        }
    }

    /// Selection state.
    pub fn set(&self) -> &SelectionSet {
        &self.set
    }

    /// Mutable selection state.
    pub fn set_mut(&mut self) -> &mut SelectionSet {
        &mut self.set
    }

    /// Row identity.
    pub fn identity(&self) -> &RowIdentity<T> {
        &self.identity
    }

    /// Keys of the rows on `snapshot`, in display order.
    pub fn page_keys(&self, snapshot: &PageSnapshot<T>) -> Vec<RowKey> {
        let offset = snapshot.query.offset();
        snapshot
            .page
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| self.identity.key_for(row, offset + i as u64))
            .collect()
    }

    /// Caches the rows of an applied page.
    pub fn remember(&mut self, snapshot: &PageSnapshot<T>) {
        let keys = self.page_keys(snapshot);
        self.rows
            .extend(keys.into_iter().zip(snapshot.page.rows().iter().cloned()));
    }

    /// Explicitly selected rows still in the cache, in key order.
    ///
    /// Keys whose rows were evicted are skipped and logged.
    pub fn materialize(&self) -> Vec<T> {
        let rows = self.rows.collect(self.set.keys());
        let missing = self.set.keys().len() - rows.len();
        if missing > 0 {
            warn!(missing, "Selected rows no longer cached");
        }
        rows
    }

    /// Number of cached rows.
    pub fn cached_rows(&self) -> usize {
        self.rows.len()
    }
}
