//! Directory watcher implementation.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs;
use tracing::debug;

use crate::config::{DEFAULT_MISSING_WAIT, WatchConfig};
use crate::error::{Result, WatcherError};
use crate::event::{EventSink, WatchEvent, WatchEventKind};
use crate::history::History;
use crate::scanner::{ScanOutcome, scan_file};

/// Lists one directory per call, scans its files and drops records for files
/// that went away.
#[derive(Debug, Clone)]
pub struct DirectoryWatcher {
    /// Keyword handed to the scanner.
    keyword: String,

    /// Only entries whose name ends with this are considered.
    extension: Option<String>,

    /// Pause taken when the directory is missing.
    missing_wait: Duration,
}

impl DirectoryWatcher {
    /// Create a watcher searching for `keyword` in every file.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            extension: None,
            missing_wait: DEFAULT_MISSING_WAIT,
        }
    }

    /// Create a watcher from a poll loop config.
    pub fn from_config(config: &WatchConfig) -> Self {
        Self {
            keyword: config.keyword.clone(),
            extension: config.extension.clone(),
            missing_wait: config.missing_wait,
        }
    }

    /// Only watch files whose name ends with `extension`.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Set the pause used when the directory is missing.
    pub fn with_missing_wait(mut self, wait: Duration) -> Self {
        self.missing_wait = wait;
        self
    }

    /// Whether a file name passes the extension filter.
    pub fn accepts(&self, file_name: &str) -> bool {
        self.extension
            .as_deref()
            .is_none_or(|ext| file_name.ends_with(ext))
    }

    /// Run one poll cycle over `directory`.
    ///
    /// A missing directory is reported, waited on and otherwise ignored. Files
    /// that vanish between the listing and the read are skipped for this
    /// cycle. Any other IO failure is returned.
    pub async fn watch(
        &self,
        directory: &Path,
        history: &mut History,
        sink: &mut dyn EventSink,
    ) -> Result<WatchOutcome> {
        let mut outcome = WatchOutcome::default();

        if let Err(e) = ensure_directory(directory).await {
            if !e.is_recoverable() {
                return Err(e);
            }
            debug!("{e}");
            sink.emit(WatchEvent::new(WatchEventKind::DirectoryMissing {
                path: directory.to_path_buf(),
            }));
            tokio::time::sleep(self.missing_wait).await;
            outcome.directory_missing = true;
            return Ok(outcome);
        }

        debug!("Scanning {}", directory.display());

        let mut listed: HashSet<PathBuf> = HashSet::new();
        let mut entries = fs::read_dir(directory).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !self.accepts(&entry.file_name().to_string_lossy()) {
                continue;
            }

            let path = entry.path();
            match fs::metadata(&path).await {
                Ok(metadata) if metadata.is_dir() => continue,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("Skipping {}: gone before it could be read", path.display());
                    listed.insert(path);
                    outcome.vanished += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            listed.insert(path.clone());

            match scan_file(&path, &self.keyword, history, sink).await {
                Ok(ScanOutcome::Unchanged) => outcome.skipped_unchanged += 1,
                Ok(ScanOutcome::Scanned {
                    discovered,
                    matches,
                }) => {
                    outcome.scanned += 1;
                    outcome.matches += matches;
                    if discovered {
                        outcome.discovered += 1;
                    }
                }
                Err(e) if e.is_recoverable() => {
                    debug!("Skipping {}: {e}", path.display());
                    outcome.vanished += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let mut stale: Vec<PathBuf> = history
            .keys_in(directory)
            .into_iter()
            .filter(|path| !listed.contains(path))
            .collect();
        stale.sort();

        for path in stale {
            history.remove(&path);
            sink.emit(WatchEvent::new(WatchEventKind::FileRemoved { path }));
            outcome.removed += 1;
        }

        debug!(
            "Polled {} (scanned: {}, unchanged: {}, new: {}, matches: {}, removed: {})",
            directory.display(),
            outcome.scanned,
            outcome.skipped_unchanged,
            outcome.discovered,
            outcome.matches,
            outcome.removed
        );

        Ok(outcome)
    }
}

async fn ensure_directory(directory: &Path) -> Result<()> {
    match fs::metadata(directory).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(WatcherError::NotADirectory(directory.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(WatcherError::DirectoryNotFound(directory.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Counts from one [`DirectoryWatcher::watch`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchOutcome {
    /// The directory did not exist.
    pub directory_missing: bool,

    /// Files that were read.
    pub scanned: usize,

    /// Files skipped because their size was unchanged.
    pub skipped_unchanged: usize,

    /// Files seen for the first time.
    pub discovered: usize,

    /// Matching lines reported.
    pub matches: usize,

    /// Records dropped because their file went away.
    pub removed: usize,

    /// Files that disappeared between listing and reading.
    pub vanished: usize,
}
