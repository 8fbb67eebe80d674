// Storage module - File storage consumed by the config manager and the logging engine

mod fs;

pub use fs::FsStorage;

use crate::error::Result;

/// Key/value style file storage addressed by absolute logical paths
/// such as `/data/LocalData.csv`.
pub trait Storage {
    /// Check whether a file or directory exists
    fn file_exists(&self, path: &str) -> bool;

    /// Read the whole file as a string
    fn read_file(&self, path: &str) -> Result<String>;

    /// Read only the first line of a file, without its terminator
    ///
    /// Returns `Ok(None)` for an empty file.
    fn read_first_line(&self, path: &str) -> Result<Option<String>> {
        let contents = self.read_file(path)?;
        Ok(contents.lines().next().map(|line| line.to_string()))
    }

    /// Replace the file's contents
    fn write_file(&self, path: &str, content: &str) -> Result<()>;

    /// Append to the end of the file
    fn append_to_file(&self, path: &str, content: &str) -> Result<()>;

    /// Create a directory (and any missing parents)
    fn create_dir(&self, path: &str) -> Result<()>;

    /// Free space available for writes, in bytes
    fn free_space(&self) -> Result<u64>;
}

/// Return the parent directory of a logical path, if it has one
pub fn parent_dir(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => None,
        Some(idx) => Some(&trimmed[..idx]),
    }
}

/// Join a directory and a file name into a logical path
pub fn join_path(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("/settings/act/LocalLogger.json"), Some("/settings/act"));
        assert_eq!(parent_dir("/data/LocalData.csv"), Some("/data"));
        assert_eq!(parent_dir("/LocalData.csv"), None);
        assert_eq!(parent_dir("LocalData.csv"), None);
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/data", "LocalData.csv"), "/data/LocalData.csv");
        assert_eq!(join_path("/data/", "run.csv"), "/data/run.csv");
    }
}
