//! In-memory record of per-file scan progress.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Scan state for one tracked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileRecord {
    /// Number of the highest line already inspected (1-based, `0` = none).
    pub last_scanned_line: u64,

    /// Byte size of the file when it was last read.
    pub last_known_size: u64,
}

impl FileRecord {
    /// Create a record for a file read up to `last_scanned_line` at `last_known_size` bytes.
    pub fn new(last_scanned_line: u64, last_known_size: u64) -> Self {
        Self {
            last_scanned_line,
            last_known_size,
        }
    }
}

/// Mapping from absolute file path to its [`FileRecord`].
///
/// Not synchronised; the poll loop is its only owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    records: HashMap<PathBuf, FileRecord>,
}

impl History {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the record for a path.
    pub fn get(&self, path: &Path) -> Option<&FileRecord> {
        self.records.get(path)
    }

    /// Insert or replace the record for a path.
    pub fn put(&mut self, path: impl Into<PathBuf>, record: FileRecord) {
        self.records.insert(path.into(), record);
    }

    /// Forget a path, returning its last record.
    pub fn remove(&mut self, path: &Path) -> Option<FileRecord> {
        self.records.remove(path)
    }

    /// Whether a path is tracked.
    pub fn contains(&self, path: &Path) -> bool {
        self.records.contains_key(path)
    }

    /// Currently tracked paths.
    pub fn keys(&self) -> impl Iterator<Item = &Path> {
        self.records.keys().map(PathBuf::as_path)
    }

    /// Tracked paths whose parent directory is `dir`.
    pub fn keys_in(&self, dir: &Path) -> Vec<PathBuf> {
        self.records
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .cloned()
            .collect()
    }

    /// Number of tracked files.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_put_get_remove() {
        let mut history = History::new();
        assert!(history.is_empty());

        history.put("/logs/app.log", FileRecord::new(3, 120));
        assert_eq!(
            history.get(Path::new("/logs/app.log")),
            Some(&FileRecord::new(3, 120))
        );

        history.put("/logs/app.log", FileRecord::new(4, 160));
        assert_eq!(history.len(), 1);
        assert_eq!(
            history.remove(Path::new("/logs/app.log")),
            Some(FileRecord::new(4, 160))
        );
        assert!(!history.contains(Path::new("/logs/app.log")));
    }

    #[test]
    fn test_keys_in_only_direct_children() {
        let mut history = History::new();
        history.put("/a/one.log", FileRecord::default());
        history.put("/a/two.log", FileRecord::default());
        history.put("/b/three.log", FileRecord::default());
        history.put("/a/nested/four.log", FileRecord::default());

        let mut keys = history.keys_in(Path::new("/a"));
        keys.sort();
        assert_eq!(
            keys,
            vec![PathBuf::from("/a/one.log"), PathBuf::from("/a/two.log")]
        );
        assert_eq!(history.keys().count(), 4);
    }
}
