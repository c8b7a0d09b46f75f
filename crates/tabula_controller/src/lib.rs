//! Remote table controller for Tabula.
//!
//! Owns the state of one paginated table backed by a remote data source:
//!
//! - [`QuerySynchronizer`] debounces search and date input and mirrors the
//!   committed [`QueryState`](tabula_core::QueryState) into a state store.
//! - [`FetchOrchestrator`] tags requests with sequence numbers and applies
//!   only the latest result.
//! - [`SelectionManager`] keeps a key-based selection across pages.
//! - [`ColumnViewManager`] persists column visibility, width and order.
//! - [`RemoteTable`] ties them together behind one handle.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod capabilities;
mod columns;
mod config;
mod debounce;
mod export;
mod orchestrator;
mod selection;
mod synchronizer;
mod table;

pub use capabilities::{IdAccessor, RowIdentity, TableCapabilities, TableRow};
pub use columns::ColumnViewManager;
pub use config::{ResetPolicy, TableConfig};
pub use debounce::Debouncer;
pub use export::{ExportOptions, TransformFn};
pub use orchestrator::{
    Completion, FetchFailure, FetchOrchestrator, FetchTicket, LoadStatus, PageSnapshot, TableBody,
    fetch_page,
};
pub use selection::{
    AllMatchingRows, SelectedRows, SelectionManager, SelectionSet, SelectionTarget,
};
pub use synchronizer::{ChannelState, DateChange, InputChannel, QuerySynchronizer, Ticket};
pub use table::{RemoteTable, TableSnapshot};
