//! Per-column view overrides: visibility, width and order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// View overrides for a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnViewState {
    /// Whether the column is shown
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    /// Width override in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Position override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,
}

fn visible_by_default() -> bool {
    true
}

impl Default for ColumnViewState {
    fn default() -> Self {
        Self {
            visible: true,
            width: None,
            order: None,
        }
    }
}

impl ColumnViewState {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Column view overrides for one table instance.
///
/// Columns never mentioned keep their defaults. Entries that return to the
/// default are dropped, so a layout with no overrides is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnLayout {
    columns: BTreeMap<String, ColumnViewState>,
}

impl ColumnLayout {
    /// Layout with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides for `column`, defaults if none were set.
    pub fn column(&self, column: &str) -> ColumnViewState {
        self.columns.get(column).copied().unwrap_or_default()
    }

    /// Whether `column` is shown.
    pub fn is_visible(&self, column: &str) -> bool {
        self.column(column).visible
    }

    /// Width override for `column`.
    pub fn width(&self, column: &str) -> Option<u32> {
        self.column(column).width
    }

    /// Whether no column is hidden.
    pub fn all_visible(&self) -> bool {
        self.columns.values().all(|c| c.visible)
    }

    /// Whether the layout carries no overrides.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn update(&mut self, column: &str, f: impl FnOnce(&mut ColumnViewState)) {
        let mut state = self.column(column);
        f(&mut state);
        if state.is_default() {
            self.columns.remove(column);
        } else {
            self.columns.insert(column.to_string(), state);
        }
    }

    fn prune(&mut self) {
        self.columns.retain(|_, c| !c.is_default());
    }

    /// Sets the pixel width of `column`.
    pub fn set_width(&mut self, column: &str, px: u32) {
        self.update(column, |c| c.width = Some(px));
    }

    /// Shows or hides `column`.
    pub fn set_visible(&mut self, column: &str, visible: bool) {
        self.update(column, |c| c.visible = visible);
    }

    /// Sets the column order. Columns not listed fall back to their default position
    /// after the listed ones.
    pub fn set_order<S: AsRef<str>>(&mut self, order: &[S]) {
        for state in self.columns.values_mut() {
            state.order = None;
        }
        for (index, column) in order.iter().enumerate() {
            self.update(column.as_ref(), |c| c.order = Some(index));
        }
        self.prune();
    }

    /// Drops every width override.
    pub fn reset_sizing(&mut self) {
        for state in self.columns.values_mut() {
            state.width = None;
        }
        self.prune();
    }

    /// Drops every order override.
    pub fn reset_order(&mut self) {
        for state in self.columns.values_mut() {
            state.order = None;
        }
        self.prune();
    }

    /// Shows every column again.
    pub fn reset_visibility(&mut self) {
        for state in self.columns.values_mut() {
            state.visible = true;
        }
        self.prune();
    }

    /// Arranges `defaults` by the order overrides, keeping the default
    /// sequence among columns without one.
    pub fn ordered<S: AsRef<str>>(&self, defaults: &[S]) -> Vec<String> {
        let mut columns: Vec<(usize, &str)> = defaults
            .iter()
            .map(|c| {
                let c = c.as_ref();
                (self.column(c).order.unwrap_or(usize::MAX), c)
            })
            .collect();
        columns.sort_by_key(|(order, _)| *order);
        columns.into_iter().map(|(_, c)| c.to_string()).collect()
    }
}
