use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, instrument, trace};

use crate::columns::ColumnRegistry;
use crate::csv_io;
use crate::domain::{CancelPolicy, DeletePolicy, Message, TEConfig, TEError};
use crate::edits::{EditBuffer, EditDraft, ValidationError};
use crate::field::Field;
use crate::persist::StateStore;
use crate::table::{Row, Table};
use crate::view::{self, Projection, SortDirection};

/// Everything a caller needs to render the editor, detached from the model.
#[derive(Debug, Clone, PartialEq)]
pub struct UIData {
    pub rows: Vec<Row>,
    pub visible_columns: Vec<String>,
    pub sort_by: Option<String>,
    pub sort_direction: SortDirection,
    pub search_query: String,
    pub current_page: usize,
    pub rows_per_page: usize,
    pub page_count: usize,
    pub total_matches: usize,
    pub total_rows: usize,
    pub drafts: Vec<EditDraft>,
    pub validation_errors: Vec<ValidationError>,
    pub can_save: bool,
    pub status_message: String,
}

pub type Listener = Box<dyn FnMut(&UIData) + Send>;

//#[derive(Debug)]
pub struct Model {
    config: TEConfig,
    table: Table,
    edits: EditBuffer,
    columns: ColumnRegistry,
    status_message: String,
    listeners: Vec<Listener>,
}

impl Model {
    pub fn new(config: TEConfig) -> Self {
        Self {
            table: Table::new(config.rows_per_page),
            config,
            edits: EditBuffer::default(),
            columns: ColumnRegistry::default(),
            status_message: String::new(),
            listeners: Vec::new(),
        }
    }

    /// Loads the persisted partitions. Missing partitions start from their defaults,
    /// drafts and validation errors always start empty.
    pub fn restore(config: TEConfig, store: &StateStore) -> Result<Self, TEError> {
        let mut model = Model::new(config);
        if let Some(table) = store.load_table()? {
            info!("Restored {} rows from {:?}", table.len(), store.dir());
            model.table = table;
        }
        if let Some(columns) = store.load_columns()? {
            model.columns = columns;
        }
        Ok(model)
    }

    pub fn persist(&self, store: &StateStore) -> Result<(), TEError> {
        store.save_all(&self.table, &self.columns)
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn edits(&self) -> &EditBuffer {
        &self.edits
    }

    pub fn columns(&self) -> &ColumnRegistry {
        &self.columns
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn set_rows_per_page(&mut self, rows_per_page: usize) {
        self.table.view.set_rows_per_page(rows_per_page);
    }

    /// Saving is allowed once something is being edited and no field is invalid.
    /// The model does not enforce this, callers do.
    pub fn can_save(&self) -> bool {
        !self.edits.is_empty() && !self.edits.has_errors()
    }

    pub fn projection(&self) -> Projection<'_> {
        view::project(self.table.rows(), &self.table.view)
    }

    pub fn uidata(&self) -> UIData {
        let projection = self.projection();
        let view = &self.table.view;
        UIData {
            rows: projection.rows.into_iter().cloned().collect(),
            visible_columns: self.columns.visible_columns().to_vec(),
            sort_by: view.sort_by.clone(),
            sort_direction: view.sort_direction,
            search_query: view.search_query.clone(),
            current_page: view.current_page,
            rows_per_page: view.rows_per_page(),
            page_count: projection.page_count,
            total_matches: projection.total_matches,
            total_rows: self.table.len(),
            drafts: self.edits.drafts().to_vec(),
            validation_errors: self.edits.validation_errors().to_vec(),
            can_save: self.can_save(),
            status_message: self.status_message.clone(),
        }
    }

    /// Registers a listener that receives a fresh snapshot after every applied message.
    ///
    /// Listeners run inside `update`. Behind a [`SharedModel`] that means the lock is
    /// held while they run, so a listener must not call [`dispatch`] on the same model
    /// or it deadlocks. Forward the snapshot (e.g. over a channel) instead.
    pub fn subscribe(&mut self, listener: impl FnMut(&UIData) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let data = self.uidata();
        for listener in self.listeners.iter_mut() {
            listener(&data);
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    pub fn update(&mut self, message: Message) -> Result<(), TEError> {
        trace!("Update: {:?}", message);
        let result = match message {
            Message::AddRow(row) => {
                self.table.add_row(row);
                Ok(())
            }
            Message::AddBlankRow => {
                self.add_blank_row();
                Ok(())
            }
            Message::DeleteRow(id) => {
                self.delete_row(&id);
                Ok(())
            }
            Message::UpdateRow(row) => {
                if !self.table.update_row(row) {
                    trace!("Update of unknown row ignored");
                }
                Ok(())
            }
            Message::ImportRows(rows) => {
                let count = rows.len();
                self.table.import_rows(rows);
                self.set_status_message(format!("Imported {count} rows"));
                Ok(())
            }
            Message::SortRows(column) => {
                self.table.sort_rows(&column);
                Ok(())
            }
            Message::SetSearchQuery(query) => {
                self.table.view.set_search_query(query);
                Ok(())
            }
            Message::SetCurrentPage(page) => {
                self.table.view.set_current_page(page);
                Ok(())
            }
            Message::StartEditing(id) => {
                self.start_editing(&id);
                Ok(())
            }
            Message::UpdateEditingRow { id, field, value } => {
                self.edits.update_field(&id, field, value);
                Ok(())
            }
            Message::SaveAllEdits => {
                self.save_all_edits();
                Ok(())
            }
            Message::CancelAllEdits => {
                self.cancel_all_edits();
                Ok(())
            }
            Message::ToggleColumn(column) => {
                self.columns.toggle_column(&column);
                Ok(())
            }
            Message::SetVisibleColumns(columns) => {
                self.columns.set_visible_columns(columns);
                Ok(())
            }
            Message::AddColumn(name) => {
                let added = self.columns.add_column(&name);
                if added.is_ok() {
                    self.set_status_message(format!("Column \"{}\" added", name.trim()));
                }
                added
            }
            Message::MoveColumn { from, to } => {
                self.columns.move_column(from, to);
                Ok(())
            }
        };
        if let Err(e) = &result {
            self.set_status_message(e.to_string());
        }
        self.notify();
        result
    }

    // -------------------- Operations ---------------------- //

    fn start_editing(&mut self, id: &str) {
        match self.table.get(id) {
            Some(row) => {
                self.edits.start_editing(row);
            }
            None => trace!("Cannot edit unknown row {id}"),
        }
    }

    fn delete_row(&mut self, id: &str) {
        let deleted = self.table.delete_row(id);
        if deleted && self.config.delete_policy == DeletePolicy::Cascade {
            self.edits.forget(id);
        }
        debug!("Delete row {id}: deleted {deleted}");
    }

    fn save_all_edits(&mut self) {
        let drafts = self.edits.take_drafts();
        let total = drafts.len();
        let mut saved = 0;
        for EditDraft { id, fields } in drafts {
            if self.table.merge_fields(&id, fields) {
                saved += 1;
            } else {
                trace!("Skipping draft of deleted row {id}");
            }
        }
        info!("Saved {saved} of {total} drafts");
        self.set_status_message(format!("Saved {saved} edits"));
    }

    fn cancel_all_edits(&mut self) {
        self.edits.clear_drafts();
        if self.config.cancel_policy == CancelPolicy::ClearErrors {
            self.edits.clear_errors();
        }
    }

    fn add_blank_row(&mut self) {
        let mut stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        while self.table.contains(&stamp.to_string()) {
            stamp += 1;
        }
        let id = stamp.to_string();
        let row = Row::new(id.clone())
            .with(Field::Name, "")
            .with(Field::Email, "")
            .with(Field::Age, 0.0)
            .with(Field::Role, "")
            .with(Field::Department, "")
            .with(Field::Location, "");
        self.table.add_row(row);
        self.start_editing(&id);
        self.set_status_message(format!("New row {id} added"));
    }

    // -------------------- File transfer ---------------------- //

    /// Reads a CSV file and appends its rows as one batch. A rejected file leaves
    /// the model untouched.
    #[instrument(level = "debug", skip(self), err)]
    pub fn import_csv(&mut self, path: &Path) -> Result<usize, TEError> {
        let rows = match csv_io::read_rows(path) {
            Ok(rows) => rows,
            Err(e) => {
                self.set_status_message(e.to_string());
                return Err(e);
            }
        };
        let count = rows.len();
        self.update(Message::ImportRows(rows))?;
        Ok(count)
    }

    /// Writes all rows with the visible columns, in visible order.
    #[instrument(level = "debug", skip(self), err)]
    pub fn export_csv(&self, path: &Path) -> Result<(), TEError> {
        csv_io::write_rows(path, self.table.rows(), self.columns.visible_columns())
    }
}

/// A model shared between threads. Each message is applied under the lock as one transaction.
pub type SharedModel = Arc<Mutex<Model>>;

pub fn shared(model: Model) -> SharedModel {
    Arc::new(Mutex::new(model))
}

pub fn dispatch(model: &SharedModel, message: Message) -> Result<(), TEError> {
    let mut guard = model.lock().unwrap_or_else(PoisonError::into_inner);
    guard.update(message)
}
