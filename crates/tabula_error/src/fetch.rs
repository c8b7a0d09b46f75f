//! Fetch error types for the remote data source.

/// Kinds of fetch failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum FetchErrorKind {
    /// The request never produced a response (connection refused, timeout, DNS)
    #[display("Network error: {}", _0)]
    Network(String),
    /// The server answered with a failure status
    #[display("Server error {}: {}", status, message)]
    Server {
        /// HTTP-like status code
        status: u16,
        /// Server supplied message
        message: String,
    },
    /// The response body could not be decoded into rows
    #[display("Decode error: {}", _0)]
    Decode(String),
}

/// Fetch error with location tracking.
///
/// # Examples
///
/// ```
/// use tabula_error::{FetchError, FetchErrorKind};
///
/// let err = FetchError::new(FetchErrorKind::Server { status: 503, message: "busy".into() });
/// assert!(err.is_retryable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Fetch Error: {} at line {} in {}", kind, line, file)]
pub struct FetchError {
    /// The kind of error that occurred
    pub kind: FetchErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl FetchError {
    /// Create a new fetch error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: FetchErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a transport failure.
    #[track_caller]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network(message.into()))
    }

    /// Shorthand for a failure status returned by the server.
    #[track_caller]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Server {
            status,
            message: message.into(),
        })
    }

    /// Get the error kind.
    pub fn kind(&self) -> &FetchErrorKind {
        &self.kind
    }

    /// Whether offering the user a retry is likely to help.
    ///
    /// Network failures, 5xx responses, 408 and 429 are retryable. Other
    /// client errors and decode failures are not. Nothing is retried
    /// automatically; this only drives the retry affordance.
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            FetchErrorKind::Network(_) => true,
            FetchErrorKind::Server { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            FetchErrorKind::Decode(_) => false,
        }
    }
}
