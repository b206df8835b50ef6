use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::field::{Cell, Field, Value};
use crate::view::{SortDirection, ViewState};

/// One record of the table. The id is fixed at creation, every other field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: String,
    #[serde(flatten)]
    pub fields: BTreeMap<Field, Value>,
}

impl Row {
    pub fn new(id: impl Into<String>) -> Self {
        Row {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: Field, value: impl Into<Value>) -> Self {
        self.set(field, value.into());
        self
    }

    /// Sets a field. The id can not be changed through here.
    pub fn set(&mut self, field: Field, value: Value) {
        if field == Field::Id {
            trace!("Ignoring write to id of row {}", self.id);
            return;
        }
        self.fields.insert(field, value);
    }

    pub fn get(&self, field: Field) -> Option<Cell<'_>> {
        match field {
            Field::Id => Some(Cell::Text(&self.id)),
            _ => self.fields.get(&field).map(Value::as_cell),
        }
    }

    /// Cell lookup by column identifier. Custom columns never have a value.
    pub fn column(&self, column: &str) -> Option<Cell<'_>> {
        column.parse::<Field>().ok().and_then(|f| self.get(f))
    }

    /// All present cells, id first.
    pub fn cells(&self) -> impl Iterator<Item = Cell<'_>> {
        std::iter::once(Cell::Text(self.id.as_str())).chain(self.fields.values().map(Value::as_cell))
    }
}

/// The record store: canonical row order plus the view controls persisted with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    rows: Vec<Row>,
    #[serde(default)]
    pub view: ViewState,
}

impl Table {
    pub fn new(rows_per_page: usize) -> Self {
        Table {
            rows: Vec::new(),
            view: ViewState::new(rows_per_page),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Appends without checking id uniqueness.
    pub fn add_row(&mut self, row: Row) {
        trace!("Adding row {}", row.id);
        self.rows.push(row);
    }

    pub fn import_rows(&mut self, rows: Vec<Row>) {
        debug!("Importing {} rows", rows.len());
        self.rows.extend(rows);
    }

    pub fn delete_row(&mut self, id: &str) -> bool {
        let before = self.rows.len();
        self.rows.retain(|r| r.id != id);
        before != self.rows.len()
    }

    /// Replaces the first row with the same id wholesale.
    pub fn update_row(&mut self, row: Row) -> bool {
        match self.rows.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => {
                *existing = row;
                true
            }
            None => false,
        }
    }

    /// Overlays fields onto an existing row, keeping fields the overlay lacks.
    pub fn merge_fields(&mut self, id: &str, fields: BTreeMap<Field, Value>) -> bool {
        let Some(row) = self.rows.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        for (field, value) in fields {
            row.set(field, commit_value(field, value));
        }
        true
    }

    /// Sorts the whole table by `column`. Sorting the same column twice flips the direction.
    pub fn sort_rows(&mut self, column: &str) {
        let direction = if self.view.sort_by.as_deref() == Some(column) {
            self.view.sort_direction.flip()
        } else {
            SortDirection::Ascending
        };
        self.view.sort_by = Some(column.to_string());
        self.view.sort_direction = direction;

        let field = column.parse::<Field>().ok();
        let rows = std::mem::take(&mut self.rows);
        self.rows = merge_sort_by(rows, &|a: &Row, b: &Row| {
            let ord = match field.map(|f| (a.get(f), b.get(f))) {
                Some((Some(va), Some(vb))) => va.compare(&vb),
                // Missing values never move a row.
                _ => Ordering::Equal,
            };
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
        debug!("Sorted {} rows by {column} {direction:?}", self.rows.len());
    }
}

// Age typed as text in a draft lands in the store as a number when it is one.
fn commit_value(field: Field, value: Value) -> Value {
    match (&value, field.is_numeric()) {
        (Value::Text(_), true) => value.parse_finite().map(Value::Number).unwrap_or(value),
        _ => value,
    }
}

// Stable merge sort. slice::sort_by may panic on a comparator that is not a
// total order, and "missing compares equal to everything" is not one.
fn merge_sort_by<T, F>(mut items: Vec<T>, cmp: &F) -> Vec<T>
where
    F: Fn(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort_by(items, cmp);
    let right = merge_sort_by(right, cmp);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => cmp(r, l) == Ordering::Less,
            _ => break,
        };
        if take_right {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    merged
}
