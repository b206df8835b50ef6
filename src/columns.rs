use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::domain::{DEFAULT_COLUMNS, TEError};

/// Ordered list of visible column identifiers. Names are free form, a column
/// does not have to match a known row field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRegistry {
    visible_columns: Vec<String>,
}

impl Default for ColumnRegistry {
    fn default() -> Self {
        ColumnRegistry {
            visible_columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl ColumnRegistry {
    pub fn visible_columns(&self) -> &[String] {
        &self.visible_columns
    }

    pub fn is_visible(&self, column: &str) -> bool {
        self.visible_columns.iter().any(|c| c == column)
    }

    pub fn toggle_column(&mut self, column: &str) {
        if self.is_visible(column) {
            self.visible_columns.retain(|c| c != column);
        } else {
            self.visible_columns.push(column.to_string());
        }
    }

    /// Replaces the list as given, order included. No de-duplication.
    pub fn set_visible_columns(&mut self, columns: Vec<String>) {
        self.visible_columns = columns;
    }

    /// Appends a custom column. Blank names are ignored.
    pub fn add_column(&mut self, name: &str) -> Result<(), TEError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        if self.is_visible(trimmed) {
            return Err(TEError::ColumnExists(trimmed.to_string()));
        }
        let mut updated = self.visible_columns.clone();
        updated.push(trimmed.to_string());
        self.set_visible_columns(updated);
        Ok(())
    }

    /// Moves the column at `from` to position `to`, as a drag and drop would.
    pub fn move_column(&mut self, from: usize, to: usize) {
        let len = self.visible_columns.len();
        if from >= len || to >= len {
            trace!("Ignoring column move {from} -> {to} with {len} columns");
            return;
        }
        let mut reordered = self.visible_columns.clone();
        let moved = reordered.remove(from);
        reordered.insert(to, moved);
        self.set_visible_columns(reordered);
    }
}
