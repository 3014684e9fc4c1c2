//! Error types for the directory watcher.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Errors that can occur in the directory watcher.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Directory not found.
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// Path exists but is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// File disappeared between the directory listing and the read.
    #[error("file vanished before it could be read: {}", .0.display())]
    FileVanished(PathBuf),

    /// Search keyword is empty.
    #[error("invalid keyword: the search keyword must not be empty")]
    InvalidKeyword,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Config file could not be parsed.
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl WatcherError {
    /// Whether this condition heals itself on a later poll and should not be
    /// reported as a fault.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DirectoryNotFound(_) | Self::NotADirectory(_) | Self::FileVanished(_)
        )
    }

    /// Map an IO error hit while touching `path` to the error a caller should see.
    pub(crate) fn from_file_io(path: PathBuf, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::FileVanished(path)
        } else {
            Self::Io(err)
        }
    }
}
