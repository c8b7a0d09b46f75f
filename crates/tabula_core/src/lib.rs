//! Core data types for the Tabula remote table controller.
//!
//! This crate holds the data model shared by every layer: the canonical
//! [`QueryState`], the request derived from it, the [`Page`] a data source
//! returns, the URL-shaped [`UrlState`] and the [`RowKey`] used for selection.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod columns;
mod date;
mod observability;
mod page;
mod query;
mod row_key;
mod sort;
mod url_state;

pub use columns::{ColumnLayout, ColumnViewState};
pub use date::{DAY_FORMAT, DateRange, format_day, parse_day};
pub use observability::{FetchOutcome, init_metrics, init_tracing, record_fetch};
pub use page::Page;
pub use query::{DEFAULT_PAGE_SIZE, FetchRequest, FilterKey, QueryState, preprocess_search};
pub use row_key::RowKey;
pub use sort::SortOrder;
pub use url_state::{
    DATE_RANGE_KEY, DecodedQuery, FILTERS_KEY, MANAGED_KEYS, PAGE_KEY, PAGE_SIZE_KEY, SEARCH_KEY,
    SORT_BY_KEY, SORT_ORDER_KEY, UrlState,
};
