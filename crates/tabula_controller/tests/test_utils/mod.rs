//! Test utilities for tabula_controller tests.
//!
//! Provides an in-memory people directory served through [`MockSource`] and
//! an export sink that records jobs.

#![allow(dead_code)]

pub mod mock_source;

pub use mock_source::{MockSource, Person, RecordingSink, people};

use std::sync::Arc;
use tabula_controller::{RemoteTable, TableCapabilities, TableConfig};

/// Config with distinct search and date windows.
pub fn test_config(table_id: &str) -> TableConfig {
    TableConfig::new(table_id)
        .with_search_debounce_ms(500)
        .with_date_debounce_ms(150)
}

/// Mounts a table over `source` with default capabilities.
pub fn mount(source: Arc<MockSource>, config: TableConfig) -> RemoteTable<Person> {
    RemoteTable::mount(config, TableCapabilities::<Person>::new(source)).expect("mount")
}
