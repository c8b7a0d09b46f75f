//! Validation error types for external state input.

/// Kinds of validation failures found while reading external state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ValidationErrorKind {
    /// A date could not be parsed in any supported format
    #[display("Unparseable date for '{}': {}", key, value)]
    Date {
        /// External key the value was read from
        key: String,
        /// Raw value
        value: String,
    },
    /// A numeric field held something other than a positive integer
    #[display("Expected positive integer for '{}', got '{}'", key, value)]
    NotPositive {
        /// External key the value was read from
        key: String,
        /// Raw value
        value: String,
    },
    /// A sort order other than `asc` or `desc`
    #[display("Unknown sort order: {}", _0)]
    SortOrder(String),
    /// A JSON-encoded entry failed to decode
    #[display("Malformed JSON for '{}': {}", key, message)]
    Json {
        /// External key the value was read from
        key: String,
        /// Decoder message
        message: String,
    },
}

/// Validation error with location tracking.
///
/// Validation errors never escape the synchronizer: the offending entry is
/// treated as absent and the error is reported for logging.
///
/// # Examples
///
/// ```
/// use tabula_error::{ValidationError, ValidationErrorKind};
///
/// let err = ValidationError::new(ValidationErrorKind::SortOrder("sideways".to_string()));
/// assert!(format!("{}", err).contains("sideways"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {} at line {} in {}", kind, line, file)]
pub struct ValidationError {
    /// The kind of error that occurred
    pub kind: ValidationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new validation error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ValidationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ValidationErrorKind {
        &self.kind
    }
}
