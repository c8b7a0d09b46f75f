//! Export collaborator and the job it receives.

use async_trait::async_trait;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tabula_error::ExportError;

/// One exported row, keyed by column.
pub type ExportRecord = BTreeMap<String, serde_json::Value>;

/// File format requested from the export sink.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    /// Comma separated values
    Csv,
    /// Excel workbook
    Xlsx,
}

/// Which rows an export covers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExportScope {
    /// The current selection
    Selected,
    /// Every row of the resource, ignoring search, date and column filters
    All,
    /// Every row matching the current filters
    Filtered,
}

/// A column in the exported artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ExportColumn {
    /// Record key
    key: String,
    /// Header text
    header: String,
    /// Width hint in characters, used by spreadsheet formats
    width: Option<u32>,
}

impl ExportColumn {
    /// Column with a header and no width hint.
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            width: None,
        }
    }

    /// Adds a width hint.
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }
}

/// Everything an export sink needs to produce one artifact.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct ExportJob {
    /// Requested format
    format: ExportFormat,
    /// Rows covered
    scope: ExportScope,
    /// Human name of the exported entity, used for file naming
    entity_name: String,
    /// Column mapping in output order
    columns: Vec<ExportColumn>,
    /// Transformed rows
    records: Vec<ExportRecord>,
}

impl ExportJob {
    /// Creates a job.
    pub fn new(
        format: ExportFormat,
        scope: ExportScope,
        entity_name: impl Into<String>,
        columns: Vec<ExportColumn>,
        records: Vec<ExportRecord>,
    ) -> Self {
        Self {
            format,
            scope,
            entity_name: entity_name.into(),
            columns,
            records,
        }
    }

    /// Headers in output order.
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }
}

/// Produces a downloadable artifact from an [`ExportJob`].
///
/// Encoding (CSV quoting, workbook layout) is entirely the sink's concern.
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Writes the artifact.
    async fn export(&self, job: ExportJob) -> Result<(), ExportError>;
}
