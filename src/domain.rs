use std::fmt;
use std::io::Error;
use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;

use crate::field::{Field, Value};
use crate::table::Row;

pub const ROWS_PER_PAGE: usize = 10;
pub const MAX_COLUMN_WIDTH: usize = 24;

/// Columns shown on a fresh session.
pub const DEFAULT_COLUMNS: [&str; 6] = ["name", "email", "age", "role", "department", "location"];

/// An imported CSV header has to contain at least these columns.
pub const REQUIRED_IMPORT_COLUMNS: [&str; 5] = ["id", "name", "email", "age", "role"];

#[derive(Debug)]
pub enum TEError {
    IoError(Error),
    PolarsError(PolarsError),
    CsvError(csv::Error),
    JsonError(serde_json::Error),
    LoadingFailed(String),
    MissingColumns(Vec<String>),
    ColumnExists(String),
    InvalidPath(String),
    InvalidCommand(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl fmt::Display for TEError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TEError::IoError(e) => write!(f, "io error: {e}"),
            TEError::PolarsError(e) => write!(f, "could not read table: {e}"),
            TEError::CsvError(e) => write!(f, "could not write csv: {e}"),
            TEError::JsonError(e) => write!(f, "could not read or write state: {e}"),
            TEError::LoadingFailed(msg) => write!(f, "loading failed: {msg}"),
            TEError::MissingColumns(cols) => {
                write!(f, "invalid CSV format, required columns missing: {}", cols.join(", "))
            }
            TEError::ColumnExists(col) => write!(f, "column \"{col}\" already exists"),
            TEError::InvalidPath(msg) => write!(f, "invalid path: {msg}"),
            TEError::InvalidCommand(msg) => write!(f, "invalid command: {msg}"),
            TEError::FileNotFound => write!(f, "file not found"),
            TEError::PermissionDenied => write!(f, "permission denied"),
            TEError::UnknownFileType => write!(f, "unknown file type, expected .csv"),
        }
    }
}

impl std::error::Error for TEError {}

impl From<Error> for TEError {
    fn from(err: Error) -> Self {
        TEError::IoError(err)
    }
}

impl From<PolarsError> for TEError {
    fn from(err: PolarsError) -> Self {
        TEError::PolarsError(err)
    }
}

impl From<csv::Error> for TEError {
    fn from(err: csv::Error) -> Self {
        TEError::CsvError(err)
    }
}

impl From<serde_json::Error> for TEError {
    fn from(err: serde_json::Error) -> Self {
        TEError::JsonError(err)
    }
}

/// What happens to drafts and validation errors of a deleted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Drafts and errors outlive the row; a later save skips it.
    #[default]
    Retain,
    Cascade,
}

/// Whether cancelling all edits also forgets validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancelPolicy {
    #[default]
    RetainErrors,
    ClearErrors,
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct TEConfig {
    pub rows_per_page: usize,
    pub max_column_width: usize,
    pub delete_policy: DeletePolicy,
    pub cancel_policy: CancelPolicy,
    #[setters(into)]
    pub state_dir: PathBuf,
}

impl Default for TEConfig {
    fn default() -> Self {
        TEConfig {
            rows_per_page: ROWS_PER_PAGE,
            max_column_width: MAX_COLUMN_WIDTH,
            delete_policy: DeletePolicy::default(),
            cancel_policy: CancelPolicy::default(),
            state_dir: PathBuf::from(".tabedit"),
        }
    }
}

/// Every intent the editor understands. One message is one atomic operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    AddRow(Row),
    AddBlankRow,
    DeleteRow(String),
    UpdateRow(Row),
    ImportRows(Vec<Row>),
    SortRows(String),
    SetSearchQuery(String),
    SetCurrentPage(usize),
    StartEditing(String),
    UpdateEditingRow { id: String, field: Field, value: Value },
    SaveAllEdits,
    CancelAllEdits,
    ToggleColumn(String),
    SetVisibleColumns(Vec<String>),
    AddColumn(String),
    MoveColumn { from: usize, to: usize },
}

pub const HELP_TEXT: &str = "\
Commands (one per argument to `apply`):
    add <id> [field=value ...]   append a row
    new                          append a blank row and start editing it
    delete <id>                  delete a row
    sort <column>                sort by column, again to flip direction
    search <text>                filter rows, resets to the first page
    page <n>                     go to page n (zero based)
    edit <id>                    start editing a row
    set <id> <field> <value>     change a field of an edited row
    save                         commit all edits (refused while errors exist)
    cancel                       discard all edits
    toggle <column>              show or hide a column
    columns <a,b,c>              set visible columns in order
    add-column <name>            append a custom column
    move-column <from> <to>      move a visible column";
