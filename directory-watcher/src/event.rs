//! Events reported by the watcher and the sinks that observe them.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Severity attached to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Normal progress.
    Info,

    /// Something is off but will be retried.
    Warn,

    /// A poll cycle failed.
    Error,
}

/// A single observation made by the watcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchEvent {
    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,

    /// What happened.
    #[serde(flatten)]
    pub kind: WatchEventKind,
}

impl WatchEvent {
    /// Create an event stamped with the current time.
    pub fn new(kind: WatchEventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }

    /// Severity of the event.
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// Kind of watch event, with the facts it carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WatchEventKind {
    /// The poll loop is about to start.
    Started {
        directories: Vec<PathBuf>,
        keyword: String,
        extension: Option<String>,
        #[serde(serialize_with = "serialize_secs")]
        interval: Duration,
    },

    /// A watched directory does not exist (or is not a directory).
    DirectoryMissing { path: PathBuf },

    /// A file is tracked for the first time.
    FileDiscovered { name: String, directory: PathBuf },

    /// The keyword was found on a newly scanned line.
    MatchFound {
        keyword: String,
        name: String,
        directory: PathBuf,
        line: u64,
    },

    /// A tracked file is no longer in its directory.
    FileRemoved { path: PathBuf },

    /// A poll cycle failed; the loop carries on.
    CycleError { detail: String },

    /// The poll loop stopped.
    Shutdown { uptime: Uptime },
}

impl WatchEventKind {
    /// Severity of this kind of event.
    pub fn severity(&self) -> Severity {
        match self {
            Self::DirectoryMissing { .. } => Severity::Warn,
            Self::CycleError { .. } => Severity::Error,
            Self::Started { .. }
            | Self::FileDiscovered { .. }
            | Self::MatchFound { .. }
            | Self::FileRemoved { .. }
            | Self::Shutdown { .. } => Severity::Info,
        }
    }
}

impl fmt::Display for WatchEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started {
                directories,
                keyword,
                extension,
                interval,
            } => {
                let dirs = directories
                    .iter()
                    .map(|d| d.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Starting: watching {dirs} for \"{keyword}\"")?;
                if let Some(ext) = extension {
                    write!(f, " in *{ext} files")?;
                }
                write!(f, " every {}s", interval.as_secs_f64())
            }
            Self::DirectoryMissing { path } => {
                write!(f, "Directory {} not found. Waiting", path.display())
            }
            Self::FileDiscovered { name, directory } => {
                write!(f, "New file: {name}, found in {}", directory.display())
            }
            Self::MatchFound {
                keyword,
                name,
                line,
                ..
            } => write!(f, "Found {keyword} in {name} at line {line}"),
            Self::FileRemoved { path } => write!(f, "File {} removed", path.display()),
            Self::CycleError { detail } => write!(f, "Poll cycle failed: {detail}"),
            Self::Shutdown { uptime } => write!(f, "Exiting. Uptime: {uptime}"),
        }
    }
}

/// Wall-clock time the poll loop was running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Uptime(pub Duration);

impl Uptime {
    /// The wrapped duration.
    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

/// Renders as `H:MM:SS.ffffff`.
impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.as_secs();
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;
        let micros = self.0.subsec_micros();
        write!(f, "{hours}:{minutes:02}:{seconds:02}.{micros:06}")
    }
}

impl Serialize for Uptime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0.as_secs_f64())
    }
}

fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

/// Observer of watch events.
///
/// The watcher never formats or writes output itself; everything it has to
/// say goes through a sink.
pub trait EventSink: Send {
    /// Receive one event.
    fn emit(&mut self, event: WatchEvent);
}

/// Forwards events to `tracing` at their severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: WatchEvent) {
        match &event.kind {
            WatchEventKind::Started { keyword, .. } => info!(%keyword, "{event}"),
            WatchEventKind::DirectoryMissing { path } => {
                warn!(path = %path.display(), "{event}");
            }
            WatchEventKind::FileDiscovered { name, directory } => {
                info!(file = %name, directory = %directory.display(), "{event}");
            }
            WatchEventKind::MatchFound {
                keyword,
                name,
                line,
                ..
            } => info!(%keyword, file = %name, line, "{event}"),
            WatchEventKind::FileRemoved { path } => info!(path = %path.display(), "{event}"),
            WatchEventKind::CycleError { .. } => error!("{event}"),
            WatchEventKind::Shutdown { uptime } => {
                info!(uptime_secs = uptime.as_duration().as_secs_f64(), "{event}");
            }
        }
    }
}

/// Writes each event as one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Create a sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_event(&mut self, event: &WatchEvent) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn emit(&mut self, event: WatchEvent) {
        if let Err(e) = self.write_event(&event) {
            warn!("Failed to write event: {e}");
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Vec<WatchEvent>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far.
    pub fn events(&self) -> &[WatchEvent] {
        &self.events
    }

    /// Kinds recorded so far, in order.
    pub fn kinds(&self) -> Vec<&WatchEventKind> {
        self.events.iter().map(|e| &e.kind).collect()
    }

    /// Line numbers of recorded matches for the file called `name`.
    pub fn match_lines(&self, name: &str) -> Vec<u64> {
        self.events
            .iter()
            .filter_map(|e| match &e.kind {
                WatchEventKind::MatchFound { name: n, line, .. } if n == name => Some(*line),
                _ => None,
            })
            .collect()
    }

    /// Number of discovery events for a file name.
    pub fn discoveries(&self, name: &str) -> usize {
        self.events
            .iter()
            .filter(|e| {
                matches!(&e.kind, WatchEventKind::FileDiscovered { name: n, .. } if n == name)
            })
            .count()
    }

    /// Number of removal events for a path.
    pub fn removals(&self, path: &Path) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(&e.kind, WatchEventKind::FileRemoved { path: p } if p == path))
            .count()
    }

    /// Drain recorded events.
    pub fn take(&mut self) -> Vec<WatchEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: WatchEvent) {
        self.events.push(event);
    }
}

impl EventSink for mpsc::UnboundedSender<WatchEvent> {
    fn emit(&mut self, event: WatchEvent) {
        if self.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }
}
