//! Canonical query state and the request derived from it.

use crate::{DateRange, SortOrder};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rows per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Canonical filter, sort and paging state for one table instance.
///
/// Values are replaced wholesale: every `with_*` method consumes the state
/// and returns the updated one, so a snapshot handed to the fetch layer can
/// never change underneath it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct QueryState {
    /// Current page, starting at 1
    page: u32,
    /// Rows per page
    page_size: u32,
    /// Trimmed search text, empty for no filter
    search: String,
    /// Optional calendar-day filter
    date_range: Option<DateRange>,
    /// Column to sort by
    sort_by: Option<String>,
    /// Sort direction
    sort_order: SortOrder,
    /// Per-column filters
    filters: BTreeMap<String, String>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: String::new(),
            date_range: None,
            sort_by: None,
            sort_order: SortOrder::default(),
            filters: BTreeMap::new(),
        }
    }
}

impl QueryState {
    /// Default state with the given page size and default sort.
    pub fn with_defaults(page_size: u32, sort_by: Option<String>, sort_order: SortOrder) -> Self {
        Self::default()
            .with_page_size(page_size)
            .with_sort(sort_by, sort_order)
    }

    /// Sets the page, clamping to 1.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Sets the page size, clamping to 1.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sets the search text, trimming surrounding whitespace.
    pub fn with_search(mut self, search: impl AsRef<str>) -> Self {
        self.search = search.as_ref().trim().to_string();
        self
    }

    /// Sets or clears the date filter. A fully open range is stored as `None`.
    pub fn with_date_range(mut self, range: Option<DateRange>) -> Self {
        self.date_range = range.filter(|r| !r.is_cleared());
        self
    }

    /// Sets the sort column and direction.
    pub fn with_sort(mut self, sort_by: Option<String>, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by.filter(|s| !s.is_empty());
        self.sort_order = sort_order;
        self
    }

    /// Sets a column filter. An empty value removes it.
    pub fn with_filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        let column = column.into();
        let value = value.into();
        if value.is_empty() {
            self.filters.remove(&column);
        } else {
            self.filters.insert(column, value);
        }
        self
    }

    /// Replaces every column filter at once.
    pub fn with_filters(mut self, filters: BTreeMap<String, String>) -> Self {
        self.filters = filters.into_iter().filter(|(_, v)| !v.is_empty()).collect();
        self
    }

    /// Zero-based offset of the first row on the current page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// The part of the state that decides which rows match.
    pub fn filter_key(&self) -> FilterKey {
        FilterKey {
            search: self.search.clone(),
            date_range: self.date_range,
            filters: self.filters.clone(),
        }
    }

    /// Whether any search, date or column filter is active.
    pub fn is_filtered(&self) -> bool {
        !self.search.is_empty() || self.date_range.is_some() || !self.filters.is_empty()
    }
}

/// Identity of a filtered data set, independent of paging and sorting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterKey {
    search: String,
    date_range: Option<DateRange>,
    filters: BTreeMap<String, String>,
}

/// Collapses runs of whitespace inside a search term to single spaces.
pub fn preprocess_search(search: &str) -> String {
    search.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The request a data source receives for one page.
///
/// Built deterministically from a [`QueryState`]: equal states produce equal
/// requests and identical query strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct FetchRequest {
    /// Page number, starting at 1
    page: u32,
    /// Rows per page
    limit: u32,
    /// Search term, whitespace normalized
    search: Option<String>,
    /// Inclusive lower day bound as `YYYY-MM-DD`
    from_date: Option<String>,
    /// Inclusive upper day bound as `YYYY-MM-DD`
    to_date: Option<String>,
    /// Sort column
    sort_by: Option<String>,
    /// Sort direction
    sort_order: Option<SortOrder>,
    /// Column filters
    filter: BTreeMap<String, String>,
}

impl FetchRequest {
    /// Request for the page described by `query`.
    pub fn from_query(query: &QueryState) -> Self {
        let search = preprocess_search(query.search());
        let range = query.date_range();
        Self {
            page: *query.page(),
            limit: *query.page_size(),
            search: (!search.is_empty()).then_some(search),
            from_date: range.and_then(|r| r.from_day_string()),
            to_date: range.and_then(|r| r.to_day_string()),
            sort_by: query.sort_by().clone(),
            sort_order: query.sort_by().as_ref().map(|_| *query.sort_order()),
            filter: query.filters().clone(),
        }
    }

    /// Request for the first `limit` rows matching `query`, ignoring its page.
    pub fn all_matching(query: &QueryState, limit: u32) -> Self {
        let mut request = Self::from_query(query);
        request.page = 1;
        request.limit = limit.max(1);
        request
    }

    /// Query parameters in the order the remote resource documents them.
    ///
    /// Absent values are omitted. Column filters are sent as one JSON object
    /// under `filter`.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(from) = &self.from_date {
            pairs.push(("from_date", from.clone()));
        }
        if let Some(to) = &self.to_date {
            pairs.push(("to_date", to.clone()));
        }
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sort_by", sort_by.clone()));
        }
        if let Some(order) = self.sort_order {
            pairs.push(("sort_order", order.to_string()));
        }
        if !self.filter.is_empty() {
            match serde_json::to_string(&self.filter) {
                Ok(json) => pairs.push(("filter", json)),
                Err(e) => tracing::warn!(error = %e, "Failed to encode column filters"),
            }
        }
        pairs
    }

    /// Form-encoded query string, e.g. `page=1&limit=10&search=john`.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_query_pairs())
            .finish()
    }
}

impl From<&QueryState> for FetchRequest {
    fn from(query: &QueryState) -> Self {
        Self::from_query(query)
    }
}
