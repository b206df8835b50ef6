use std::collections::BTreeMap;

use tracing::trace;

use crate::field::{Field, Value};
use crate::table::Row;
use crate::validator::validate;

/// Unsaved changes for one row, a full copy of its fields taken when editing started.
#[derive(Debug, Clone, PartialEq)]
pub struct EditDraft {
    pub id: String,
    pub fields: BTreeMap<Field, Value>,
}

/// Field errors of one row's draft. Never stored empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub id: String,
    pub errors: BTreeMap<Field, String>,
}

/// Drafts and their validation errors, kept apart from the record store until commit.
#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    drafts: Vec<EditDraft>,
    errors: Vec<ValidationError>,
}

impl EditBuffer {
    pub fn drafts(&self) -> &[EditDraft] {
        &self.drafts
    }

    pub fn draft(&self, id: &str) -> Option<&EditDraft> {
        self.drafts.iter().find(|d| d.id == id)
    }

    pub fn is_editing(&self, id: &str) -> bool {
        self.draft(id).is_some()
    }

    pub fn validation_errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn errors_for(&self, id: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.id == id)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Snapshots `row` into a new draft. An existing draft is left untouched.
    pub fn start_editing(&mut self, row: &Row) -> bool {
        if self.is_editing(&row.id) {
            trace!("Row {} is already being edited", row.id);
            return false;
        }
        self.drafts.push(EditDraft {
            id: row.id.clone(),
            fields: row.fields.clone(),
        });
        true
    }

    /// Writes one draft field and revalidates it. Without a draft this does nothing.
    pub fn update_field(&mut self, id: &str, field: Field, value: Value) -> bool {
        if field == Field::Id {
            trace!("Ignoring edit of id for row {id}");
            return false;
        }
        let Some(draft) = self.drafts.iter_mut().find(|d| d.id == id) else {
            trace!("No draft for row {id}, ignoring edit of {field}");
            return false;
        };
        let error = validate(field, &value);
        draft.fields.insert(field, value);
        self.record_error(id, field, error);
        true
    }

    fn record_error(&mut self, id: &str, field: Field, error: Option<&'static str>) {
        let existing = self.errors.iter().position(|e| e.id == id);
        match (error, existing) {
            (Some(msg), Some(idx)) => {
                self.errors[idx].errors.insert(field, msg.to_string());
            }
            (Some(msg), None) => {
                self.errors.push(ValidationError {
                    id: id.to_string(),
                    errors: BTreeMap::from([(field, msg.to_string())]),
                });
            }
            (None, Some(idx)) => {
                self.errors[idx].errors.remove(&field);
                if self.errors[idx].errors.is_empty() {
                    self.errors.remove(idx);
                }
            }
            (None, None) => {}
        }
    }

    /// Hands out every draft for commit and leaves the buffer without drafts.
    pub fn take_drafts(&mut self) -> Vec<EditDraft> {
        std::mem::take(&mut self.drafts)
    }

    pub fn clear_drafts(&mut self) {
        self.drafts.clear();
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Drops the draft and errors of a single row.
    pub fn forget(&mut self, id: &str) {
        self.drafts.retain(|d| d.id != id);
        self.errors.retain(|e| e.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{AGE_ERROR, EMAIL_ERROR};

    fn row() -> Row {
        Row::new("1")
            .with(Field::Name, "John")
            .with(Field::Email, "john@example.com")
            .with(Field::Age, 28.0)
    }

    #[test]
    fn start_editing_snapshots_and_is_idempotent() {
        let mut buffer = EditBuffer::default();
        assert!(buffer.start_editing(&row()));
        assert_eq!(buffer.draft("1").unwrap().fields, row().fields);

        buffer.update_field("1", Field::Name, Value::text("Jon"));
        let before = buffer.draft("1").cloned();
        assert!(!buffer.start_editing(&row()));
        assert_eq!(buffer.draft("1").cloned(), before);
        assert_eq!(buffer.drafts().len(), 1);
    }

    #[test]
    fn update_without_draft_is_ignored() {
        let mut buffer = EditBuffer::default();
        assert!(!buffer.update_field("1", Field::Age, Value::text("x")));
        assert!(buffer.is_empty());
        assert!(!buffer.has_errors());
    }

    #[test]
    fn age_error_tracks_latest_value() {
        let mut buffer = EditBuffer::default();
        buffer.start_editing(&row());
        let age_error = |b: &EditBuffer| {
            b.errors_for("1")
                .and_then(|e| e.errors.get(&Field::Age).cloned())
        };

        for (value, invalid) in [("abc", true), ("", true), ("31", false), ("x1", true), (" 9 ", false)] {
            buffer.update_field("1", Field::Age, Value::text(value));
            assert_eq!(age_error(&buffer).is_some(), invalid, "value {value:?}");
        }
        assert!(!buffer.has_errors());
    }

    #[test]
    fn errors_clear_field_by_field() {
        let mut buffer = EditBuffer::default();
        buffer.start_editing(&row());
        buffer.update_field("1", Field::Age, Value::text("old"));
        buffer.update_field("1", Field::Email, Value::text("nope"));

        let errors = buffer.errors_for("1").unwrap();
        assert_eq!(errors.errors.get(&Field::Age).map(String::as_str), Some(AGE_ERROR));
        assert_eq!(errors.errors.get(&Field::Email).map(String::as_str), Some(EMAIL_ERROR));

        buffer.update_field("1", Field::Age, Value::text("40"));
        let errors = buffer.errors_for("1").unwrap();
        assert!(!errors.errors.contains_key(&Field::Age));
        assert!(errors.errors.contains_key(&Field::Email));

        buffer.update_field("1", Field::Email, Value::text("ok@mail.io"));
        assert!(buffer.errors_for("1").is_none());
        assert!(buffer.validation_errors().is_empty());
    }

    #[test]
    fn id_field_is_not_editable() {
        let mut buffer = EditBuffer::default();
        buffer.start_editing(&row());
        assert!(!buffer.update_field("1", Field::Id, Value::text("2")));
        assert!(!buffer.draft("1").unwrap().fields.contains_key(&Field::Id));
    }

    #[test]
    fn forget_removes_draft_and_errors() {
        let mut buffer = EditBuffer::default();
        buffer.start_editing(&row());
        buffer.update_field("1", Field::Email, Value::text("bad"));
        buffer.forget("1");
        assert!(buffer.is_empty());
        assert!(!buffer.has_errors());
    }
}
