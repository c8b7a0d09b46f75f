//! Persistence of column view overrides per table identity.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabula_core::ColumnLayout;
use tabula_error::{StoreError, StoreErrorKind};
use tracing::{debug, info, instrument};

/// Stores column layouts keyed by a caller-chosen table identity.
///
/// Two tables with different identities never see each other's layout.
pub trait ViewStateStore: Send + Sync {
    /// Layout saved for `table_id`, if any.
    fn load(&self, table_id: &str) -> Result<Option<ColumnLayout>, StoreError>;

    /// Saves the layout for `table_id`. An empty layout removes the entry.
    fn save(&self, table_id: &str, layout: &ColumnLayout) -> Result<(), StoreError>;
}

/// In-process layout store.
#[derive(Debug, Clone, Default)]
pub struct MemoryViewStore {
    layouts: Arc<Mutex<HashMap<String, ColumnLayout>>>,
}

impl MemoryViewStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tables with a saved layout.
    pub fn len(&self) -> usize {
        self.layouts.lock().len()
    }

    /// Whether no layouts are saved.
    pub fn is_empty(&self) -> bool {
        self.layouts.lock().is_empty()
    }
}

impl ViewStateStore for MemoryViewStore {
    fn load(&self, table_id: &str) -> Result<Option<ColumnLayout>, StoreError> {
        Ok(self.layouts.lock().get(table_id).cloned())
    }

    fn save(&self, table_id: &str, layout: &ColumnLayout) -> Result<(), StoreError> {
        let mut layouts = self.layouts.lock();
        if layout.is_empty() {
            layouts.remove(table_id);
        } else {
            layouts.insert(table_id.to_string(), layout.clone());
        }
        Ok(())
    }
}

/// Layout store writing one JSON file per table.
#[derive(Debug, Clone)]
pub struct FileViewStore {
    dir: PathBuf,
}

impl FileViewStore {
    /// Store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform data directory, e.g.
    /// `~/.local/share/tabula/columns` on Linux.
    pub fn default_location() -> Result<Self, StoreError> {
        let base = dirs::data_dir().ok_or_else(|| {
            StoreError::new(StoreErrorKind::Unavailable(
                "no platform data directory".to_string(),
            ))
        })?;
        Ok(Self::new(base.join("tabula").join("columns")))
    }

    /// Root directory of the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, table_id: &str) -> PathBuf {
        let name: String = table_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

fn io_error(e: std::io::Error) -> StoreError {
    StoreError::new(StoreErrorKind::Io(e.to_string()))
}

impl ViewStateStore for FileViewStore {
    #[instrument(skip(self))]
    fn load(&self, table_id: &str) -> Result<Option<ColumnLayout>, StoreError> {
        let path = self.path_for(table_id);
        debug!(path = ?path, "Loading column layout");
        if !path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&path).map_err(io_error)?;
        let layout = serde_json::from_str(&json).map_err(|e| {
            StoreError::new(StoreErrorKind::Corrupt {
                table_id: table_id.to_string(),
                message: e.to_string(),
            })
        })?;
        Ok(Some(layout))
    }

    #[instrument(skip(self, layout))]
    fn save(&self, table_id: &str, layout: &ColumnLayout) -> Result<(), StoreError> {
        let path = self.path_for(table_id);
        if layout.is_empty() {
            if path.exists() {
                std::fs::remove_file(&path).map_err(io_error)?;
                info!(path = ?path, "Column layout cleared");
            }
            return Ok(());
        }

        std::fs::create_dir_all(&self.dir).map_err(io_error)?;
        let json = serde_json::to_string_pretty(layout).map_err(|e| {
            StoreError::new(StoreErrorKind::Corrupt {
                table_id: table_id.to_string(),
                message: e.to_string(),
            })
        })?;
        std::fs::write(&path, json).map_err(io_error)?;
        debug!(path = ?path, "Column layout saved");
        Ok(())
    }
}
