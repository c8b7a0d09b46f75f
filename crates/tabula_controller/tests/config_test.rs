//! Table configuration loading and validation.

use std::io::Write;
use std::time::Duration;
use tabula_controller::{ResetPolicy, TableConfig};
use tabula_core::SortOrder;
use tabula_error::TabulaErrorKind;

#[test]
fn test_defaults() {
    let config = TableConfig::new("orders");
    assert_eq!(config.table_id(), "orders");
    assert_eq!(config.search_debounce(), Duration::from_millis(500));
    assert_eq!(config.date_debounce(), Duration::from_millis(150));
    assert_eq!(*config.default_page_size(), 10);
    assert_eq!(*config.default_sort_order(), SortOrder::Desc);
    assert!(*config.enable_url_state());
    assert_eq!(config.reset(), &ResetPolicy::default());
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_toml_overrides_only_given_keys() {
    let config = TableConfig::from_toml(
        r#"
        table_id = "invoices"
        default_sort_by = "created_at"
        default_sort_order = "asc"
        default_page_size = 25
        search_debounce_ms = 300
        enable_export = false

        [reset]
        reset_column_visibility = true
        "#,
    )
    .expect("parse");

    assert_eq!(config.table_id(), "invoices");
    assert_eq!(config.default_sort_by().as_deref(), Some("created_at"));
    assert_eq!(*config.default_sort_order(), SortOrder::Asc);
    assert!(!*config.enable_export());
    assert!(*config.reset().reset_column_visibility());
    assert!(!*config.reset().reset_column_sizing());
    assert_eq!(*config.date_debounce_ms(), 150);

    let query = config.default_query();
    assert_eq!(*query.page_size(), 25);
    assert_eq!(query.sort_by().as_deref(), Some("created_at"));
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "table_id = \"people\"\nmax_export_size = 500").expect("write");

    let config = TableConfig::from_file(file.path()).expect("load");
    assert_eq!(config.table_id(), "people");
    assert_eq!(*config.max_export_size(), 500);
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = TableConfig::from_toml("default_page_size = 0").expect_err("invalid");
    assert!(matches!(err.kind(), TabulaErrorKind::Config(_)));

    let err = TableConfig::from_toml("table_id = 5").expect_err("type error");
    assert!(err.to_string().contains("Failed to parse config"));

    assert!(TableConfig::new(" ").validate().is_err());
    assert!(
        TableConfig::default()
            .with_page_size_options(vec![10, 0])
            .validate()
            .is_err()
    );
}

#[test]
fn test_env_overrides() {
    // SAFETY: no other test in this binary reads these variables.
    unsafe {
        std::env::set_var("TABULA_SEARCH_DEBOUNCE_MS", "250");
        std::env::set_var("TABULA_DATE_DEBOUNCE_MS", "not a number");
        std::env::set_var("TABULA_MAX_EXPORT_SIZE", "42");
    }
    let config = TableConfig::default().with_env_overrides();
    unsafe {
        std::env::remove_var("TABULA_SEARCH_DEBOUNCE_MS");
        std::env::remove_var("TABULA_DATE_DEBOUNCE_MS");
        std::env::remove_var("TABULA_MAX_EXPORT_SIZE");
    }

    assert_eq!(*config.search_debounce_ms(), 250);
    assert_eq!(*config.date_debounce_ms(), 150);
    assert_eq!(*config.max_export_size(), 42);
}
