//! Collaborator traits for the Tabula remote table controller.
//!
//! The controller reaches everything outside itself through these traits:
//! the remote [`DataSource`], the shareable [`StateStore`], the column
//! [`ViewStateStore`] and the [`ExportSink`].

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod data_source;
mod export;
mod state_store;
mod view_store;

pub use data_source::DataSource;
pub use export::{ExportColumn, ExportFormat, ExportJob, ExportRecord, ExportScope, ExportSink};
pub use state_store::{MemoryStateStore, StateStore};
pub use view_store::{FileViewStore, MemoryViewStore, ViewStateStore};
