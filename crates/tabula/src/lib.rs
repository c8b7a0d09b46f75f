//! Tabula: a headless controller for paginated, server-backed data tables.
//!
//! Tabula keeps one canonical query state per table (search, date range,
//! sort, paging and column filters), debounces noisy input, fetches pages
//! from a remote [`DataSource`] so that only the newest result is ever shown,
//! mirrors the state into a shareable [`StateStore`], and tracks selection,
//! column layout and exports.
//!
//! # Crates
//!
//! - [`tabula_error`]: error types with location tracking
//! - [`tabula_core`]: query state, requests, pages, URL encoding
//! - [`tabula_interface`]: collaborator traits and in-memory implementations
//! - [`tabula_cache`]: bounded row cache used for cross-page selection
//! - [`tabula_controller`]: the [`RemoteTable`] controller
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tabula::{DataSource, FetchError, FetchRequest, Page, RemoteTable, TableCapabilities, TableConfig};
//!
//! #[derive(Debug, Clone, serde::Serialize)]
//! struct Invoice {
//!     id: u64,
//!     customer: String,
//! }
//!
//! struct Invoices;
//!
//! #[async_trait::async_trait]
//! impl DataSource<Invoice> for Invoices {
//!     async fn fetch_page(&self, request: &FetchRequest) -> Result<Page<Invoice>, FetchError> {
//!         let rows = vec![Invoice { id: 1, customer: "Ada".into() }];
//!         let _ = request.to_query_string();
//!         Ok(Page::new(rows, 1))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> tabula::TabulaResult<()> {
//! let caps = TableCapabilities::<Invoice>::new(Arc::new(Invoices));
//! let table = RemoteTable::mount(TableConfig::new("invoices"), caps)?;
//!
//! table.set_search("ada");
//! let snapshot = table.settled().await;
//! assert_eq!(snapshot.query().search(), "ada");
//! assert_eq!(snapshot.rows().len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use tabula_cache::{CacheEntry, RowCache, RowCacheConfig};
pub use tabula_controller::*;
pub use tabula_core::*;
pub use tabula_error::*;
pub use tabula_interface::*;
