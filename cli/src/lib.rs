//! Command-line front end: parses arguments, sets up logging and signal
//! handling, then hands over to [`PollLoop`].

mod logging;
mod signals;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use dirwatch_directory_watcher::config::{DEFAULT_INTERVAL, DEFAULT_MISSING_WAIT};
use dirwatch_directory_watcher::{
    EventSink, FileConfig, JsonLinesSink, PollLoop, TracingSink, WatchConfig,
    parse_directory_list,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use logging::init_logging;
pub use signals::listen_for_shutdown;

/// Watch directories for a keyword in newly written lines.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "dirwatch", version, about)]
pub struct Cli {
    /// Directory or comma-separated list of directories to watch [default: .]
    #[arg(
        short = 'd',
        long = "directory",
        visible_alias = "dir",
        short_alias = 'D',
        env = "DIRWATCH_DIRECTORY"
    )]
    pub directory: Option<String>,

    /// Only watch files whose name ends with this (e.g. `.log`)
    #[arg(
        short = 'e',
        long = "extension",
        visible_alias = "ext",
        short_alias = 'E',
        env = "DIRWATCH_EXTENSION"
    )]
    pub extension: Option<String>,

    /// Seconds between scans [default: 1]
    #[arg(
        short = 'i',
        long = "interval",
        visible_alias = "int",
        short_alias = 'I',
        env = "DIRWATCH_INTERVAL"
    )]
    pub interval: Option<u64>,

    /// Word to search for
    #[arg(
        short = 'm',
        long = "magic",
        visible_alias = "word",
        short_alias = 'w',
        env = "DIRWATCH_KEYWORD"
    )]
    pub magic: Option<String>,

    /// Seconds to wait before retrying a missing directory [default: 5]
    #[arg(long = "missing-wait", env = "DIRWATCH_MISSING_WAIT")]
    pub missing_wait: Option<u64>,

    /// TOML file with defaults for any of the options above
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Print events to stdout as JSON lines instead of logging them
    #[arg(long = "json-events", default_value_t = false)]
    pub json_events: bool,

    /// Log debug output
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Merge flags over `file` and the built-in defaults.
    pub fn resolve(&self, file: FileConfig) -> Result<WatchConfig> {
        let keyword = self
            .magic
            .clone()
            .or(file.keyword)
            .ok_or_else(|| anyhow!("missing required keyword: pass --magic <WORD>"))?;

        let directory = self
            .directory
            .clone()
            .or(file.directory)
            .unwrap_or_else(|| ".".to_string());

        let mut config = WatchConfig::new(keyword)
            .with_directories(parse_directory_list(&directory))
            .with_interval(
                self.interval
                    .or(file.interval_secs)
                    .map_or(DEFAULT_INTERVAL, Duration::from_secs),
            )
            .with_missing_wait(
                self.missing_wait
                    .or(file.missing_wait_secs)
                    .map_or(DEFAULT_MISSING_WAIT, Duration::from_secs),
            );
        if let Some(extension) = self.extension.clone().or(file.extension) {
            config = config.with_extension(extension);
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

/// Run the watcher until SIGINT or SIGTERM, measuring uptime from `started`.
pub async fn run_main(cli: Cli, started: Instant) -> Result<()> {
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    let file_config = match &cli.config {
        Some(path) => FileConfig::load(path)
            .await
            .with_context(|| format!("failed to load config file {}", path.display()))?,
        None => FileConfig::default(),
    };
    let config = cli.resolve(file_config)?;
    debug!("Resolved configuration: {config:?}");

    let mut poll_loop = PollLoop::new(config)?.started_at(started);

    let shutdown = CancellationToken::new();
    let listener =
        listen_for_shutdown(shutdown.clone()).context("failed to install signal handlers")?;

    let mut sink: Box<dyn EventSink> = if cli.json_events {
        Box::new(JsonLinesSink::new(std::io::stdout()))
    } else {
        Box::new(TracingSink)
    };

    poll_loop.run(sink.as_mut(), shutdown).await;
    listener.abort();

    Ok(())
}
