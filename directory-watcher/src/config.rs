//! Configuration types for directory watching.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, WatcherError};

/// Default seconds between polls.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Default pause after finding a watched directory missing.
pub const DEFAULT_MISSING_WAIT: Duration = Duration::from_secs(5);

/// Runtime parameters for the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Directories to watch, in order.
    pub directories: Vec<PathBuf>,

    /// Only files whose name ends with this suffix are watched.
    pub extension: Option<String>,

    /// Time between poll cycles.
    pub interval: Duration,

    /// Literal text to search for.
    pub keyword: String,

    /// How long to pause when a directory is missing.
    pub missing_wait: Duration,
}

impl WatchConfig {
    /// Create a config watching the current directory for `keyword`.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            directories: vec![PathBuf::from(".")],
            extension: None,
            interval: DEFAULT_INTERVAL,
            keyword: keyword.into(),
            missing_wait: DEFAULT_MISSING_WAIT,
        }
    }

    /// Replace the watched directories.
    pub fn with_directories<I, P>(mut self, directories: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.directories = directories.into_iter().map(Into::into).collect();
        self
    }

    /// Set the extension filter.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Set the poll interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the pause used when a directory is missing.
    pub fn with_missing_wait(mut self, wait: Duration) -> Self {
        self.missing_wait = wait;
        self
    }

    /// Check that the config can drive a poll loop.
    pub fn validate(&self) -> Result<()> {
        if self.keyword.is_empty() {
            return Err(WatcherError::InvalidKeyword);
        }
        if self.directories.is_empty() {
            return Err(WatcherError::Config(
                "at least one directory must be watched".to_string(),
            ));
        }
        if self.interval.is_zero() {
            return Err(WatcherError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.extension.as_deref() == Some("") {
            return Err(WatcherError::Config(
                "extension filter must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Split a comma-separated directory list.
///
/// Items are trimmed; empty items and repeats are dropped.
pub fn parse_directory_list(list: &str) -> Vec<PathBuf> {
    let mut directories: Vec<PathBuf> = Vec::new();
    for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let path = PathBuf::from(item);
        if !directories.contains(&path) {
            directories.push(path);
        }
    }
    directories
}

/// Optional settings read from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Directory or comma-separated list of directories.
    pub directory: Option<String>,

    /// Extension filter.
    pub extension: Option<String>,

    /// Seconds between polls.
    pub interval_secs: Option<u64>,

    /// Keyword to search for.
    pub keyword: Option<String>,

    /// Seconds to pause when a directory is missing.
    pub missing_wait_secs: Option<u64>,
}

impl FileConfig {
    /// Parse settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read settings from a TOML file.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&text)
    }
}
