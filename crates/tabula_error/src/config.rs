//! Table configuration errors.

/// A table configuration that could not be read or does not hold together.
///
/// Raised while loading TOML and by validation, for example when the default
/// page size is not one of the offered page sizes.
///
/// # Examples
///
/// ```
/// use tabula_error::{ConfigError, TabulaError};
///
/// let options = [10, 20, 50];
/// let default_page_size = 25;
/// let err = ConfigError::new(format!(
///     "default_page_size {default_page_size} is not in page_size_options {options:?}"
/// ));
/// assert!(err.message.contains("page_size_options"));
///
/// let err: TabulaError = err.into();
/// assert!(err.to_string().contains("Configuration Error"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// What is wrong with the configuration
    pub message: String,
    /// Line number where the error was raised
    pub line: u32,
    /// File where the error was raised
    pub file: &'static str,
}

impl ConfigError {
    /// Error with `message`, located at the caller.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
