//! # Directory Watcher
//!
//! Polls directories on a fixed interval and incrementally scans the files in
//! them for a keyword. Only lines added since the previous poll are searched,
//! and files whose size has not changed are not read at all.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Directory Watcher                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  PollLoop ──► DirectoryWatcher ──► scan_file ──► History        │
//! │     │                │                 │                        │
//! │     ▼                ▼                 ▼                        │
//! │  CancellationToken   EventSink ◄──── WatchEvent                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here runs concurrently: one cycle lists each directory, scans the
//! files in it one after another and then drops records for files that are
//! gone.

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod history;
pub mod scanner;
pub mod watcher;

pub use config::{FileConfig, WatchConfig, parse_directory_list};
pub use controller::{CycleReport, LoopState, PollLoop};
pub use error::{Result, WatcherError};
pub use event::{
    EventSink, JsonLinesSink, RecordingSink, Severity, TracingSink, Uptime, WatchEvent,
    WatchEventKind,
};
pub use history::{FileRecord, History};
pub use scanner::{ScanOutcome, scan_file};
pub use watcher::{DirectoryWatcher, WatchOutcome};
