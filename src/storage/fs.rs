use crate::error::{LoggerError, Result};
use crate::storage::Storage;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use sysinfo::Disks;

/// Storage backed by a directory on the local filesystem
///
/// Logical paths are resolved relative to `root`, so `/data/x.csv`
/// lands at `<root>/data/x.csv`.
#[derive(Debug, Clone)]
pub struct FsStorage {
    /// Directory every logical path is resolved under
    root: PathBuf,
    /// Fixed free space figure used instead of querying the disk
    free_space_override: Option<u64>,
}

impl FsStorage {
    /// Create a storage rooted at the given directory
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            free_space_override: None,
        }
    }

    /// Report a fixed amount of free space instead of the disk's
    pub fn with_free_space(mut self, bytes: u64) -> Self {
        self.free_space_override = Some(bytes);
        self
    }

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a logical path onto the filesystem
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    /// Available bytes on the disk whose mount point holds the root
    fn disk_available_space(&self) -> Result<u64> {
        let root = self
            .root
            .canonicalize()
            .unwrap_or_else(|_| self.root.clone());

        let disks = Disks::new_with_refreshed_list();
        disks
            .list()
            .iter()
            .filter(|disk| root.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .map(|disk| disk.available_space())
            .ok_or_else(|| {
                LoggerError::Storage(format!("No disk found holding {}", root.display()))
            })
    }
}

impl Storage for FsStorage {
    fn file_exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn read_file(&self, path: &str) -> Result<String> {
        fs::read_to_string(self.resolve(path))
            .map_err(|e| LoggerError::Storage(format!("Failed to read {}: {}", path, e)))
    }

    fn read_first_line(&self, path: &str) -> Result<Option<String>> {
        let file = File::open(self.resolve(path))
            .map_err(|e| LoggerError::Storage(format!("Failed to open {}: {}", path, e)))?;

        let mut reader = BufReader::new(file);
        let mut line = String::new();
        let read = reader
            .read_line(&mut line)
            .map_err(|e| LoggerError::Storage(format!("Failed to read {}: {}", path, e)))?;

        if read == 0 {
            return Ok(None);
        }

        let trimmed = line.trim_end_matches(&['\n', '\r'][..]);
        Ok(Some(trimmed.to_string()))
    }

    fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let target = self.resolve(path);

        // Write to a temporary file first (atomic write pattern)
        let temp_path = target.with_extension("tmp");

        {
            let mut file = File::create(&temp_path).map_err(|e| {
                LoggerError::Storage(format!("Failed to create {}: {}", temp_path.display(), e))
            })?;

            file.write_all(content.as_bytes())
                .map_err(|e| LoggerError::Storage(format!("Failed to write {}: {}", path, e)))?;

            file.flush()
                .map_err(|e| LoggerError::Storage(format!("Failed to flush {}: {}", path, e)))?;
        }

        fs::rename(&temp_path, &target)
            .map_err(|e| LoggerError::Storage(format!("Failed to replace {}: {}", path, e)))?;

        Ok(())
    }

    fn append_to_file(&self, path: &str, content: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.resolve(path))
            .map_err(|e| LoggerError::Storage(format!("Failed to open {}: {}", path, e)))?;

        file.write_all(content.as_bytes())
            .map_err(|e| LoggerError::Storage(format!("Failed to append to {}: {}", path, e)))?;

        file.flush()
            .map_err(|e| LoggerError::Storage(format!("Failed to flush {}: {}", path, e)))?;

        Ok(())
    }

    fn create_dir(&self, path: &str) -> Result<()> {
        fs::create_dir_all(self.resolve(path)).map_err(|e| {
            LoggerError::Storage(format!("Failed to create directory {}: {}", path, e))
        })
    }

    fn free_space(&self) -> Result<u64> {
        match self.free_space_override {
            Some(bytes) => Ok(bytes),
            None => self.disk_available_space(),
        }
    }
}
