//! Remote paginated data source.

use async_trait::async_trait;
use tabula_core::{FetchRequest, Page};
use tabula_error::FetchError;

/// A remote resource that serves rows one page at a time.
///
/// Implementations typically issue
/// `GET <resource>?page&limit&search&from_date&to_date&sort_by&sort_order`
/// using [`FetchRequest::to_query_pairs`] and decode `{ rows, total }`.
/// The controller never retries on its own; a returned error is shown to the
/// user exactly once.
#[async_trait]
pub trait DataSource<T>: Send + Sync {
    /// Fetches the page described by `request`.
    async fn fetch_page(&self, request: &FetchRequest) -> Result<Page<T>, FetchError>;
}
