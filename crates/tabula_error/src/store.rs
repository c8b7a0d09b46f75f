//! View-state persistence errors.

/// Kinds of view-state store failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StoreErrorKind {
    /// I/O error while reading or writing a layout
    #[display("I/O error: {}", _0)]
    Io(String),
    /// Stored layout could not be decoded
    #[display("Corrupt layout for table {}: {}", table_id, message)]
    Corrupt {
        /// Table identity key
        table_id: String,
        /// Decoder message
        message: String,
    },
    /// No usable storage directory
    #[display("Storage unavailable: {}", _0)]
    Unavailable(String),
}

/// Store error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    /// The kind of error that occurred
    pub kind: StoreErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StoreError {
    /// Create a new store error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
