//! Collaborators injected into a table at mount.

use crate::ExportOptions;
use serde::Serialize;
use std::sync::Arc;
use tabula_core::RowKey;
use tabula_interface::{DataSource, ExportSink, MemoryViewStore, StateStore, ViewStateStore};

/// Bounds every row type must meet.
pub trait TableRow: Serialize + Clone + std::fmt::Debug + Send + Sync + 'static {}

impl<T> TableRow for T where T: Serialize + Clone + std::fmt::Debug + Send + Sync + 'static {}

/// Reads a row's identifier.
pub type IdAccessor<T> = Arc<dyn Fn(&T) -> Option<RowKey> + Send + Sync>;

/// How rows are identified for selection and caching.
///
/// Rows without a usable identifier fall back to their absolute position in
/// the result set, which is only stable while the filter and sort are.
pub struct RowIdentity<T> {
    accessor: IdAccessor<T>,
}

impl<T> Clone for RowIdentity<T> {
    fn clone(&self) -> Self {
        Self {
            accessor: Arc::clone(&self.accessor),
        }
    }
}

impl<T> std::fmt::Debug for RowIdentity<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowIdentity").finish_non_exhaustive()
    }
}

impl<T: Serialize + 'static> RowIdentity<T> {
    /// Identify rows by the serialized value of `id_field`.
    pub fn field(id_field: impl Into<String>) -> Self {
        let id_field = id_field.into();
        Self {
            accessor: Arc::new(move |row: &T| RowKey::from_row(row, &id_field)),
        }
    }
}

impl<T> RowIdentity<T> {
    /// Identify rows with a custom accessor.
    pub fn custom<F>(accessor: F) -> Self
    where
        F: Fn(&T) -> Option<RowKey> + Send + Sync + 'static,
    {
        Self {
            accessor: Arc::new(accessor),
        }
    }

    /// Key for `row`, found at absolute `offset` in the result set.
    pub fn key_for(&self, row: &T, offset: u64) -> RowKey {
        (self.accessor)(row).unwrap_or_else(|| RowKey::positional(offset))
    }
}

/// Everything a table reaches outside itself through.
///
/// Only the data source is required. Without a state store the query state
/// lives in memory only; without a view store column layout is kept per
/// process; without an export sink exports fail with a clear error.
pub struct TableCapabilities<T> {
    source: Arc<dyn DataSource<T>>,
    identity: RowIdentity<T>,
    state_store: Option<Arc<dyn StateStore>>,
    view_store: Arc<dyn ViewStateStore>,
    export_sink: Option<Arc<dyn ExportSink>>,
    export: ExportOptions<T>,
}

impl<T: Serialize + 'static> TableCapabilities<T> {
    /// Capabilities around `source`, identifying rows by their `id` field.
    pub fn new(source: Arc<dyn DataSource<T>>) -> Self {
        Self {
            source,
            identity: RowIdentity::field("id"),
            state_store: None,
            view_store: Arc::new(MemoryViewStore::new()),
            export_sink: None,
            export: ExportOptions::default(),
        }
    }

    /// Identify rows by `id_field` instead of `id`.
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.identity = RowIdentity::field(id_field);
        self
    }
}

impl<T> TableCapabilities<T> {
    /// Identify rows with a custom accessor.
    pub fn with_identity(mut self, identity: RowIdentity<T>) -> Self {
        self.identity = identity;
        self
    }

    /// Mirror query state into `store`.
    pub fn with_state_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.state_store = Some(store);
        self
    }

    /// Persist column layout in `store`.
    pub fn with_view_store(mut self, store: Arc<dyn ViewStateStore>) -> Self {
        self.view_store = store;
        self
    }

    /// Hand exports to `sink`.
    pub fn with_export_sink(mut self, sink: Arc<dyn ExportSink>) -> Self {
        self.export_sink = Some(sink);
        self
    }

    /// Export naming, columns and row transform.
    pub fn with_export(mut self, export: ExportOptions<T>) -> Self {
        self.export = export;
        self
    }

    /// Data source.
    pub fn source(&self) -> &Arc<dyn DataSource<T>> {
        &self.source
    }

    /// Row identity.
    pub fn identity(&self) -> &RowIdentity<T> {
        &self.identity
    }

    /// External state store, if any.
    pub fn state_store(&self) -> Option<&Arc<dyn StateStore>> {
        self.state_store.as_ref()
    }

    /// Column layout store.
    pub fn view_store(&self) -> &Arc<dyn ViewStateStore> {
        &self.view_store
    }

    /// Export sink, if any.
    pub fn export_sink(&self) -> Option<&Arc<dyn ExportSink>> {
        self.export_sink.as_ref()
    }

    /// Export options.
    pub fn export(&self) -> &ExportOptions<T> {
        &self.export
    }
}
