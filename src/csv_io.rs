use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{REQUIRED_IMPORT_COLUMNS, TEError};
use crate::field::{Field, Value};
use crate::table::Row;

#[derive(Debug)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_size: u64,
}

pub fn get_file_info(path: &Path) -> Result<FileInfo, TEError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TEError::FileNotFound,
        ErrorKind::PermissionDenied => TEError::PermissionDenied,
        _ => TEError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(TEError::LoadingFailed("Not a file!".into()));
    }
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileInfo {
            path: path.to_path_buf(),
            file_size: metadata.len(),
        }),
        _ => Err(TEError::UnknownFileType),
    }
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    // Schema inference over zero rows reads every column as a string.
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_truncate_ragged_lines(true)
        .finish()
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<Vec<Option<String>>, PolarsError> {
    let col = df.column(col_name)?.cast(&DataType::String)?;
    let series = col.str()?;
    Ok(series.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Reads rows from a CSV file. The header has to contain every required
/// column, otherwise nothing is returned and the import is rejected as a whole.
pub fn read_rows(path: &Path) -> Result<Vec<Row>, TEError> {
    let file_info = get_file_info(path)?;
    let start_time = Instant::now();
    let df = load_csv(&file_info.path)?.collect()?;

    let header: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let missing: Vec<String> = REQUIRED_IMPORT_COLUMNS
        .iter()
        .filter(|required| !header.iter().any(|h| h == *required))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        warn!("Rejecting {:?}, missing columns {:?}", file_info.path, missing);
        return Err(TEError::MissingColumns(missing));
    }

    let nrows = df.height();
    // Blank lines come back as records without a single value.
    let mut blank = vec![true; nrows];
    for name in &header {
        for (i, value) in load_column(&df, name)?.iter().enumerate() {
            if value.is_some() {
                blank[i] = false;
            }
        }
    }
    let optional = |name: &str| -> Result<Vec<Option<String>>, PolarsError> {
        if header.iter().any(|h| h == name) {
            load_column(&df, name)
        } else {
            Ok(vec![None; nrows])
        }
    };
    let ids = load_column(&df, "id")?;
    let names = load_column(&df, "name")?;
    let emails = load_column(&df, "email")?;
    let ages = load_column(&df, "age")?;
    let roles = load_column(&df, "role")?;
    let departments = optional("department")?;
    let locations = optional("location")?;

    let text = |v: &Option<String>| Value::text(v.clone().unwrap_or_default());
    let rows: Vec<Row> = (0..nrows)
        .filter(|&i| !blank[i])
        .map(|i| {
            Row::new(ids[i].clone().unwrap_or_default())
                .with(Field::Name, text(&names[i]))
                .with(Field::Email, text(&emails[i]))
                .with(Field::Age, Value::coerce_number(ages[i].as_deref().unwrap_or("")))
                .with(Field::Role, text(&roles[i]))
                .with(Field::Department, text(&departments[i]))
                .with(Field::Location, text(&locations[i]))
        })
        .collect();

    info!(
        "Read {} rows ({} bytes) from {:?} in {}ms",
        rows.len(),
        file_info.file_size,
        file_info.path,
        start_time.elapsed().as_millis()
    );
    Ok(rows)
}

/// Writes every row, restricted to `columns` in the given order, with a header line.
/// Cells a row has no value for stay empty.
pub fn write_rows(path: &Path, rows: &[Row], columns: &[String]) -> Result<(), TEError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(columns)?;
    for row in rows {
        let record: Vec<String> = columns
            .iter()
            .map(|c| row.column(c).map(|cell| cell.to_string()).unwrap_or_default())
            .collect();
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    debug!("Wrote {} rows with columns {:?} to {:?}", rows.len(), columns, path);
    Ok(())
}
