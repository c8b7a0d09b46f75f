//! Turning rows into export records.

use serde::Serialize;
use std::sync::Arc;
use tabula_error::{ExportError, ExportErrorKind};
use tabula_interface::{ExportColumn, ExportRecord};

/// Maps a row to the record written for it.
pub type TransformFn<T> = Arc<dyn Fn(&T) -> ExportRecord + Send + Sync>;

/// Naming, column mapping and row transform for exports.
pub struct ExportOptions<T> {
    entity_name: String,
    columns: Vec<ExportColumn>,
    transform: Option<TransformFn<T>>,
}

impl<T> Default for ExportOptions<T> {
    fn default() -> Self {
        Self {
            entity_name: "rows".to_string(),
            columns: Vec::new(),
            transform: None,
        }
    }
}

impl<T> std::fmt::Debug for ExportOptions<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportOptions")
            .field("entity_name", &self.entity_name)
            .field("columns", &self.columns)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl<T> ExportOptions<T> {
    /// Options naming the exported entity.
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            ..Self::default()
        }
    }

    /// Sets the column mapping, in output order.
    pub fn with_columns(mut self, columns: Vec<ExportColumn>) -> Self {
        self.columns = columns;
        self
    }

    /// Replaces the default serde-based transform.
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&T) -> ExportRecord + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Human name of the exported entity.
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Column mapping.
    pub fn columns(&self) -> &[ExportColumn] {
        &self.columns
    }
}

impl<T: Serialize> ExportOptions<T> {
    /// Transforms `rows` into records.
    ///
    /// Without a custom transform each row is serialized and, when columns
    /// are configured, narrowed to their keys.
    pub fn to_records(&self, rows: &[T]) -> Result<Vec<ExportRecord>, ExportError> {
        match &self.transform {
            Some(transform) => Ok(rows.iter().map(|row| transform(row)).collect()),
            None => rows.iter().map(|row| self.serialize(row)).collect(),
        }
    }

    fn serialize(&self, row: &T) -> Result<ExportRecord, ExportError> {
        let value = serde_json::to_value(row)
            .map_err(|e| ExportError::new(ExportErrorKind::Encode(e.to_string())))?;
        let mut record = match value {
            serde_json::Value::Object(map) => map.into_iter().collect::<ExportRecord>(),
            other => ExportRecord::from([("value".to_string(), other)]),
        };
        if !self.columns.is_empty() {
            record.retain(|key, _| self.columns.iter().any(|c| c.key() == key));
        }
        Ok(record)
    }
}
