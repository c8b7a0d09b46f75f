//! Export error types.

/// Kinds of export failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ExportErrorKind {
    /// The requested row set is larger than the configured export limit
    #[display("Export of {} rows exceeds limit of {}", requested, limit)]
    Bounds {
        /// Rows the export would contain
        requested: u64,
        /// Configured maximum
        limit: u64,
    },
    /// The data source returned fewer rows than it reported as matching
    #[display("Export received {} of {} matching rows", received, expected)]
    Incomplete {
        /// Rows returned
        received: u64,
        /// Rows the data source reported
        expected: u64,
    },
    /// A row could not be turned into an export record
    #[display("Failed to encode row for export: {}", _0)]
    Encode(String),
    /// Export is switched off for this table
    #[display("Export disabled for table {}", _0)]
    Disabled(String),
    /// No export sink was supplied
    #[display("No export sink configured")]
    MissingSink,
    /// The export collaborator failed to produce the artifact
    #[display("Export sink failed: {}", _0)]
    Sink(String),
}

/// Export error with location tracking.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Export Error: {} at line {} in {}", kind, line, file)]
pub struct ExportError {
    /// The kind of error that occurred
    pub kind: ExportErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ExportError {
    /// Create a new export error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ExportErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ExportErrorKind {
        &self.kind
    }
}
