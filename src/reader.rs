// Reader module - Reading rows back out of a data file

use crate::engine::{FrozenSchema, TIME_COLUMN};
use crate::error::{LoggerError, Result};
use crate::storage::Storage;

/// One parsed data row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRow {
    /// The timestamp cell
    pub timestamp: String,
    /// Measurement cells in column order
    pub values: Vec<String>,
}

impl DataRow {
    /// Parse a CSV line into a row
    fn parse(line: &str) -> Self {
        let mut cells = line.split(',');
        let timestamp = cells.next().unwrap_or_default().to_string();
        Self {
            timestamp,
            values: cells.map(|c| c.to_string()).collect(),
        }
    }
}

/// Header and trailing rows of a data file
#[derive(Debug, Clone)]
pub struct DataTail {
    pub schema: FrozenSchema,
    pub rows: Vec<DataRow>,
    /// Rows in the file, including those not returned
    pub total_rows: usize,
}

impl DataTail {
    /// Column titles including the timestamp column
    pub fn titles(&self) -> Vec<String> {
        std::iter::once(TIME_COLUMN.to_string())
            .chain(self.schema.columns().iter().cloned())
            .collect()
    }
}

/// Read the header and the last `lines` rows of a data file
///
/// # Arguments
/// * `storage` - Storage holding the file
/// * `path` - Logical path of the data file
/// * `lines` - Number of rows to return from the end
///
/// # Returns
/// * `Ok(DataTail)` - Header and rows
/// * `Err(LoggerError)` - The file is missing or has no valid header
pub fn read_last_rows(storage: &dyn Storage, path: &str, lines: usize) -> Result<DataTail> {
    if !storage.file_exists(path) {
        return Err(LoggerError::Storage(format!("Data file not found: {}", path)));
    }

    let contents = storage.read_file(path)?;
    let mut all_lines = contents.lines().filter(|line| !line.is_empty());

    let header = all_lines
        .next()
        .ok_or_else(|| LoggerError::Schema(format!("Data file {} has no header", path)))?;
    let schema = FrozenSchema::from_header_line(header)?;

    let rows: Vec<&str> = all_lines.collect();
    let total_rows = rows.len();

    // Take the last N lines
    let start_index = total_rows.saturating_sub(lines);

    Ok(DataTail {
        schema,
        rows: rows[start_index..].iter().map(|line| DataRow::parse(line)).collect(),
        total_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FsStorage;
    use tempfile::TempDir;

    fn storage_with(contents: &str) -> (TempDir, FsStorage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path());
        storage.create_dir("/data").unwrap();
        storage.write_file("/data/log.csv", contents).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_read_last_rows() {
        let (_dir, storage) = storage_with(
            "time,temp (C),rh (%)\nt1,20.0,40\nt2,20.5,41\nt3,21.0,42\n",
        );

        let tail = read_last_rows(&storage, "/data/log.csv", 2).unwrap();

        assert_eq!(tail.total_rows, 3);
        assert_eq!(tail.titles(), vec!["time", "temp (C)", "rh (%)"]);
        assert_eq!(
            tail.rows,
            vec![
                DataRow {
                    timestamp: "t2".to_string(),
                    values: vec!["20.5".to_string(), "41".to_string()],
                },
                DataRow {
                    timestamp: "t3".to_string(),
                    values: vec!["21.0".to_string(), "42".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_read_more_than_available() {
        let (_dir, storage) = storage_with("time,temp (C)\nt1,20.0\n");

        let tail = read_last_rows(&storage, "/data/log.csv", 50).unwrap();
        assert_eq!(tail.rows.len(), 1);
    }

    #[test]
    fn test_header_only_file() {
        let (_dir, storage) = storage_with("time,temp (C)\n");

        let tail = read_last_rows(&storage, "/data/log.csv", 10).unwrap();
        assert!(tail.rows.is_empty());
        assert_eq!(tail.total_rows, 0);
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path());

        assert!(matches!(
            read_last_rows(&storage, "/data/none.csv", 10),
            Err(LoggerError::Storage(_))
        ));
    }

    #[test]
    fn test_empty_file() {
        let (_dir, storage) = storage_with("");

        assert!(matches!(
            read_last_rows(&storage, "/data/log.csv", 10),
            Err(LoggerError::Schema(_))
        ));
    }
}
