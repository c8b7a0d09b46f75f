//! Table configuration.

use derive_getters::Getters;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tabula_core::{DEFAULT_PAGE_SIZE, QueryState, SortOrder};
use tabula_error::{ConfigError, TabulaResult};

/// What `reset_all` touches beyond the query state and selection.
///
/// Search, date range, sort, column filters, selection and the managed URL
/// keys are always cleared. Column layout is left alone unless asked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Getters, Setters)]
#[serde(default)]
#[setters(prefix = "with_")]
pub struct ResetPolicy {
    /// Show every hidden column again
    reset_column_visibility: bool,
    /// Drop column width overrides
    reset_column_sizing: bool,
    /// Drop column order overrides
    reset_column_order: bool,
}

/// Configuration for one table instance.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, Setters)]
#[serde(default)]
#[setters(prefix = "with_")]
pub struct TableConfig {
    /// Identity used to persist column layout; must be unique per table
    #[setters(into)]
    table_id: String,
    /// Accept search input
    enable_search: bool,
    /// Accept date range input
    enable_date_filter: bool,
    /// Allow exports
    enable_export: bool,
    /// Mirror query state into the external state store
    enable_url_state: bool,
    /// Allow row selection
    enable_row_selection: bool,
    /// Allow hiding columns
    enable_column_visibility: bool,
    /// Allow resizing columns
    enable_column_resizing: bool,
    /// Placeholder for the search box
    #[setters(strip_option)]
    search_placeholder: Option<String>,
    /// Sort column applied on mount and after reset
    #[setters(strip_option)]
    default_sort_by: Option<String>,
    /// Sort direction applied on mount and after reset
    default_sort_order: SortOrder,
    /// Page sizes offered to the user
    page_size_options: Vec<u32>,
    /// Page size on mount and after reset
    default_page_size: u32,
    /// Quiescence window for search input, in milliseconds
    search_debounce_ms: u64,
    /// Quiescence window for date input, in milliseconds
    date_debounce_ms: u64,
    /// Placeholder rows shown before the first page arrives
    skeleton_rows: usize,
    /// Upper bound on rows fetched for an export or all-matching selection
    max_export_size: u64,
    /// Rows remembered across pages for materializing selections
    row_cache_size: usize,
    /// Abort superseded fetches instead of only discarding their results
    abort_superseded_fetches: bool,
    /// Extra state cleared by `reset_all`
    reset: ResetPolicy,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            table_id: "table".to_string(),
            enable_search: true,
            enable_date_filter: true,
            enable_export: true,
            enable_url_state: true,
            enable_row_selection: true,
            enable_column_visibility: true,
            enable_column_resizing: true,
            search_placeholder: None,
            default_sort_by: None,
            default_sort_order: SortOrder::Desc,
            page_size_options: vec![10, 20, 30, 40, 50, 100, 150],
            default_page_size: DEFAULT_PAGE_SIZE,
            search_debounce_ms: 500,
            date_debounce_ms: 150,
            skeleton_rows: 10,
            max_export_size: 10_000,
            row_cache_size: 5_000,
            abort_superseded_fetches: true,
            reset: ResetPolicy::default(),
        }
    }
}

impl TableConfig {
    /// Default configuration for the table identified by `table_id`.
    pub fn new(table_id: impl Into<String>) -> Self {
        Self::default().with_table_id(table_id)
    }

    /// Load a table configuration from a TOML file.
    #[tracing::instrument(skip(path))]
    pub fn from_file(path: impl AsRef<Path>) -> TabulaResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parse a table configuration from TOML text.
    pub fn from_toml(content: &str) -> TabulaResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the environment.
    ///
    /// Reads:
    /// - `TABULA_SEARCH_DEBOUNCE_MS`
    /// - `TABULA_DATE_DEBOUNCE_MS`
    /// - `TABULA_MAX_EXPORT_SIZE`
    ///
    /// Unparseable values are logged and ignored.
    pub fn with_env_overrides(mut self) -> Self {
        fn read(name: &str) -> Option<u64> {
            let raw = std::env::var(name).ok()?;
            match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(name, raw, "Ignoring non-numeric environment override");
                    None
                }
            }
        }

        if let Some(ms) = read("TABULA_SEARCH_DEBOUNCE_MS") {
            self.search_debounce_ms = ms;
        }
        if let Some(ms) = read("TABULA_DATE_DEBOUNCE_MS") {
            self.date_debounce_ms = ms;
        }
        if let Some(max) = read("TABULA_MAX_EXPORT_SIZE") {
            self.max_export_size = max;
        }
        self
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table_id.trim().is_empty() {
            return Err(ConfigError::new("table_id must not be empty"));
        }
        if self.default_page_size == 0 {
            return Err(ConfigError::new("default_page_size must be positive"));
        }
        if self.page_size_options.contains(&0) {
            return Err(ConfigError::new("page_size_options must be positive"));
        }
        if self.max_export_size == 0 {
            return Err(ConfigError::new("max_export_size must be positive"));
        }
        Ok(())
    }

    /// Search quiescence window.
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Date quiescence window.
    pub fn date_debounce(&self) -> Duration {
        Duration::from_millis(self.date_debounce_ms)
    }

    /// The state a table starts from and returns to on reset.
    pub fn default_query(&self) -> QueryState {
        QueryState::with_defaults(
            self.default_page_size,
            self.default_sort_by.clone(),
            self.default_sort_order,
        )
    }
}
