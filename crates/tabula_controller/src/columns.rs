//! Column layout persisted per table identity.

use std::sync::Arc;
use tabula_core::ColumnLayout;
use tabula_interface::ViewStateStore;
use tracing::{debug, warn};

/// Column visibility, width and order for one table, saved on every change.
///
/// Store failures never reach the user: a failed load starts from defaults
/// and a failed save is logged.
pub struct ColumnViewManager {
    table_id: String,
    layout: ColumnLayout,
    store: Arc<dyn ViewStateStore>,
}

impl std::fmt::Debug for ColumnViewManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnViewManager")
            .field("table_id", &self.table_id)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl ColumnViewManager {
    /// Loads the saved layout for `table_id`.
    pub fn load(table_id: impl Into<String>, store: Arc<dyn ViewStateStore>) -> Self {
        let table_id = table_id.into();
        let layout = match store.load(&table_id) {
            Ok(Some(layout)) => {
                debug!(table_id, "Restored column layout");
                layout
            }
            Ok(None) => ColumnLayout::new(),
            Err(e) => {
                warn!(table_id, error = %e, "Failed to load column layout, using defaults");
                ColumnLayout::new()
            }
        };
        Self {
            table_id,
            layout,
            store,
        }
    }

    /// Current layout.
    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// Sets a column width in pixels.
    pub fn set_width(&mut self, column: &str, px: u32) {
        self.update(|layout| layout.set_width(column, px));
    }

    /// Shows or hides a column.
    pub fn set_visible(&mut self, column: &str, visible: bool) {
        self.update(|layout| layout.set_visible(column, visible));
    }

    /// Sets the display order.
    pub fn set_order<S: AsRef<str>>(&mut self, order: &[S]) {
        self.update(|layout| layout.set_order(order));
    }

    /// Drops width overrides.
    pub fn reset_sizing(&mut self) {
        self.update(ColumnLayout::reset_sizing);
    }

    /// Drops order overrides.
    pub fn reset_order(&mut self) {
        self.update(ColumnLayout::reset_order);
    }

    /// Shows every column.
    pub fn reset_visibility(&mut self) {
        self.update(ColumnLayout::reset_visibility);
    }

    fn update(&mut self, f: impl FnOnce(&mut ColumnLayout)) {
        let before = self.layout.clone();
        f(&mut self.layout);
        if self.layout == before {
            return;
        }
        if let Err(e) = self.store.save(&self.table_id, &self.layout) {
            warn!(table_id = self.table_id, error = %e, "Failed to save column layout");
        }
    }
}
