//! Error types for the Tabula remote table controller.
//!
//! Every error records the line and file where it was constructed. Each
//! family lives in its own module and converts into [`TabulaError`].

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod export;
mod fetch;
mod store;
mod validation;

pub use config::ConfigError;
pub use export::{ExportError, ExportErrorKind};
pub use fetch::{FetchError, FetchErrorKind};
pub use store::{StoreError, StoreErrorKind};
pub use validation::{ValidationError, ValidationErrorKind};

/// Crate-level error variants.
#[derive(Debug, derive_more::From)]
pub enum TabulaErrorKind {
    /// Malformed external state
    Validation(ValidationError),
    /// Remote data source failure
    Fetch(FetchError),
    /// Export aborted
    Export(ExportError),
    /// Configuration error
    Config(ConfigError),
    /// View-state persistence failure
    Store(StoreError),
}

impl std::fmt::Display for TabulaErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TabulaErrorKind::Validation(e) => write!(f, "{}", e),
            TabulaErrorKind::Fetch(e) => write!(f, "{}", e),
            TabulaErrorKind::Export(e) => write!(f, "{}", e),
            TabulaErrorKind::Config(e) => write!(f, "{}", e),
            TabulaErrorKind::Store(e) => write!(f, "{}", e),
        }
    }
}

/// Tabula error with kind discrimination.
#[derive(Debug)]
pub struct TabulaError(Box<TabulaErrorKind>);

impl TabulaError {
    /// Create a new error from a kind.
    pub fn new(kind: TabulaErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TabulaErrorKind {
        &self.0
    }
}

impl std::fmt::Display for TabulaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tabula Error: {}", self.0)
    }
}

impl std::error::Error for TabulaError {}

impl<T> From<T> for TabulaError
where
    T: Into<TabulaErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Tabula operations.
pub type TabulaResult<T> = std::result::Result<T, TabulaError>;
