//! A page of rows returned by a data source.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// One page of rows plus the total number of rows matching the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Page<T> {
    /// Rows on this page
    rows: Vec<T>,
    /// Rows matching the query across all pages
    #[serde(alias = "totalCount", alias = "total_count")]
    total: u64,
}

impl<T> Page<T> {
    /// Creates a page.
    pub fn new(rows: Vec<T>, total: u64) -> Self {
        Self { rows, total }
    }

    /// A page with no rows and a zero total.
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            total: 0,
        }
    }

    /// Whether the page holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows on this page.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Number of pages needed for `total` rows at `page_size` per page.
    pub fn page_count(&self, page_size: u32) -> u64 {
        if page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(page_size))
    }

    /// Consumes the page, returning its rows.
    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }
}
