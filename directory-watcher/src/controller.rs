//! The poll loop that drives the watcher until shutdown is requested.

use std::path::{Path, PathBuf};
use std::time::Instant;

use path_absolutize::Absolutize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::WatchConfig;
use crate::error::Result;
use crate::event::{EventSink, Uptime, WatchEvent, WatchEventKind};
use crate::history::History;
use crate::watcher::{DirectoryWatcher, WatchOutcome};

/// Where the poll loop is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Polling on every interval.
    Running,

    /// Stop was requested; terminal.
    ShuttingDown,
}

/// Owns the [`History`] and polls every configured directory on a fixed
/// interval.
///
/// Failures inside a cycle are reported as [`WatchEventKind::CycleError`] and
/// never end the loop; only cancellation does.
#[derive(Debug)]
pub struct PollLoop {
    config: WatchConfig,
    watcher: DirectoryWatcher,
    history: History,
    started: Instant,
    state: LoopState,
    cycles: u64,
}

impl PollLoop {
    /// Create a loop for a validated config. Uptime is measured from now.
    pub fn new(config: WatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            watcher: DirectoryWatcher::from_config(&config),
            config,
            history: History::new(),
            started: Instant::now(),
            state: LoopState::Running,
            cycles: 0,
        })
    }

    /// Measure uptime from `started` instead of from construction.
    pub fn started_at(mut self, started: Instant) -> Self {
        self.started = started;
        self
    }

    /// Current scan history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Current state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Completed poll cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Time since start.
    pub fn uptime(&self) -> Uptime {
        Uptime(self.started.elapsed())
    }

    /// Poll until `shutdown` is cancelled, then report and return the uptime.
    ///
    /// The token is checked before every cycle. A cancellation that arrives
    /// during the interval sleep ends the sleep early; one that arrives during
    /// a cycle lets that cycle finish.
    pub async fn run(
        &mut self,
        sink: &mut dyn EventSink,
        shutdown: CancellationToken,
    ) -> Uptime {
        sink.emit(WatchEvent::new(WatchEventKind::Started {
            directories: self.config.directories.clone(),
            keyword: self.config.keyword.clone(),
            extension: self.config.extension.clone(),
            interval: self.config.interval,
        }));

        while !shutdown.is_cancelled() {
            self.poll_once(sink).await;

            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        self.state = LoopState::ShuttingDown;
        let uptime = self.uptime();
        sink.emit(WatchEvent::new(WatchEventKind::Shutdown { uptime }));
        uptime
    }

    /// Run one cycle over every configured directory.
    ///
    /// A directory that fails is reported and the remaining directories are
    /// still polled.
    pub async fn poll_once(&mut self, sink: &mut dyn EventSink) -> CycleReport {
        let mut report = CycleReport::default();

        for directory in &self.config.directories {
            let result = match resolve(directory) {
                Ok(resolved) => self.watcher.watch(&resolved, &mut self.history, sink).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => {
                    report.failures += 1;
                    sink.emit(WatchEvent::new(WatchEventKind::CycleError {
                        detail: format!("{}: {e}", directory.display()),
                    }));
                }
            }
        }

        self.cycles += 1;
        debug!(
            "Cycle {} done, tracking {} files",
            self.cycles,
            self.history.len()
        );
        report
    }
}

/// Result of one [`PollLoop::poll_once`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Outcome for each directory polled successfully.
    pub outcomes: Vec<WatchOutcome>,

    /// Directories whose poll failed.
    pub failures: usize,
}

fn resolve(directory: &Path) -> Result<PathBuf> {
    Ok(directory.absolutize()?.into_owned())
}
