use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::columns::ColumnRegistry;
use crate::domain::TEError;
use crate::table::Table;

pub const TABLE_PARTITION: &str = "table";
pub const COLUMNS_PARTITION: &str = "visible_columns";

/// Session state on disk: one JSON file per partition. Drafts and validation
/// errors are never written.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        StateStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn partition_path(&self, partition: &str) -> PathBuf {
        self.dir.join(format!("{partition}.json"))
    }

    fn load<T: DeserializeOwned>(&self, partition: &str) -> Result<Option<T>, TEError> {
        let path = self.partition_path(partition);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No saved {partition} state at {path:?}");
                return Ok(None);
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Err(TEError::PermissionDenied);
            }
            Err(e) => return Err(TEError::IoError(e)),
        };
        let value = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(value))
    }

    fn save<T: Serialize>(&self, partition: &str, value: &T) -> Result<(), TEError> {
        let path = self.partition_path(partition);
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, value)?;
        Ok(())
    }

    pub fn load_table(&self) -> Result<Option<Table>, TEError> {
        self.load(TABLE_PARTITION)
    }

    pub fn load_columns(&self) -> Result<Option<ColumnRegistry>, TEError> {
        self.load(COLUMNS_PARTITION)
    }

    pub fn save_all(&self, table: &Table, columns: &ColumnRegistry) -> Result<(), TEError> {
        fs::create_dir_all(&self.dir)?;
        self.save(TABLE_PARTITION, table)?;
        self.save(COLUMNS_PARTITION, columns)?;
        info!("Saved {} rows to {:?}", table.len(), self.dir);
        Ok(())
    }

    /// Removes both partitions. Missing files are fine.
    pub fn clear(&self) -> Result<(), TEError> {
        for partition in [TABLE_PARTITION, COLUMNS_PARTITION] {
            match fs::remove_file(self.partition_path(partition)) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(TEError::IoError(e)),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::table::Row;
    use tempfile::tempdir;

    #[test]
    fn missing_partitions_load_as_none() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state"));
        assert!(store.load_table().unwrap().is_none());
        assert!(store.load_columns().unwrap().is_none());
    }

    #[test]
    fn partitions_round_trip() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state"));

        let mut table = Table::new(5);
        table.add_row(Row::new("1").with(Field::Name, "Ann").with(Field::Age, 30.0));
        table.add_row(Row::new("2").with(Field::Age, f64::NAN));
        table.sort_rows("name");
        table.view.set_search_query("an");
        let mut columns = ColumnRegistry::default();
        columns.toggle_column("email");

        store.save_all(&table, &columns).unwrap();
        assert!(store.dir().join("table.json").is_file());
        assert!(store.dir().join("visible_columns.json").is_file());

        let loaded = store.load_table().unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.view, table.view);
        assert_eq!(loaded.rows()[0], table.rows()[0]);
        assert_eq!(store.load_columns().unwrap().unwrap(), columns);

        store.clear().unwrap();
        assert!(store.load_table().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_partition_is_an_error() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        fs::write(dir.path().join("table.json"), "not json").unwrap();
        assert!(matches!(store.load_table(), Err(TEError::JsonError(_))));
    }
}
