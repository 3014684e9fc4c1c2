//! End-to-end poll cycle behaviour.
//!
//! Each test drives [`PollLoop::poll_once`] against a temporary directory and
//! checks the events a caller would observe.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dirwatch_directory_watcher::{
    FileRecord, PollLoop, RecordingSink, WatchConfig, WatchEventKind,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio_test::assert_ok;

fn append(path: &Path, lines: &[&str]) {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    for line in lines {
        writeln!(f, "{line}").unwrap();
    }
}

fn poll_loop(dir: &Path) -> PollLoop {
    let config = WatchConfig::new("ERROR")
        .with_directories([dir])
        .with_missing_wait(Duration::ZERO);
    PollLoop::new(config).unwrap()
}

fn record(poll_loop: &PollLoop, path: &Path) -> Option<FileRecord> {
    poll_loop.history().get(path).copied()
}

#[tokio::test]
async fn test_end_to_end_example() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().to_path_buf();
    let log = dir.join("app.log");
    append(&log, &["service up", "ERROR: connection refused", "retrying"]);

    let mut poll_loop = poll_loop(&dir);
    let mut sink = RecordingSink::new();
    poll_loop.poll_once(&mut sink).await;

    assert_eq!(
        sink.kinds(),
        vec![
            &WatchEventKind::FileDiscovered {
                name: "app.log".to_string(),
                directory: dir.clone(),
            },
            &WatchEventKind::MatchFound {
                keyword: "ERROR".to_string(),
                name: "app.log".to_string(),
                directory: dir.clone(),
                line: 2,
            },
        ]
    );
    sink.take();

    append(&log, &["ERROR: gave up"]);
    poll_loop.poll_once(&mut sink).await;

    assert_eq!(
        sink.kinds(),
        vec![&WatchEventKind::MatchFound {
            keyword: "ERROR".to_string(),
            name: "app.log".to_string(),
            directory: dir,
            line: 4,
        }]
    );
}

#[tokio::test]
async fn test_unchanged_file_produces_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let log = temp_dir.path().join("app.log");
    append(&log, &["ERROR", "ERROR"]);

    let mut poll_loop = poll_loop(temp_dir.path());
    let mut sink = RecordingSink::new();
    poll_loop.poll_once(&mut sink).await;
    let first = record(&poll_loop, &log).unwrap();
    sink.take();

    let report = poll_loop.poll_once(&mut sink).await;
    assert!(sink.events().is_empty());
    assert_eq!(record(&poll_loop, &log), Some(first));
    assert_eq!(report.outcomes[0].skipped_unchanged, 1);
    assert_eq!(report.outcomes[0].scanned, 0);
}

#[tokio::test]
async fn test_only_appended_lines_are_matched() {
    let temp_dir = TempDir::new().unwrap();
    let log = temp_dir.path().join("svc.log");
    append(&log, &["ERROR 1", "ok", "ERROR 3", "ok", "ERROR 5"]);

    let mut poll_loop = poll_loop(temp_dir.path());
    let mut sink = RecordingSink::new();
    poll_loop.poll_once(&mut sink).await;
    assert_eq!(sink.match_lines("svc.log"), vec![1, 3, 5]);
    sink.take();

    append(&log, &["ok", "ERROR 7", "ok", "ERROR 9"]);
    poll_loop.poll_once(&mut sink).await;
    assert_eq!(sink.match_lines("svc.log"), vec![7, 9]);
    assert_eq!(sink.discoveries("svc.log"), 0);
}

#[tokio::test]
async fn test_file_is_discovered_once_across_polls() {
    let temp_dir = TempDir::new().unwrap();
    let log = temp_dir.path().join("grow.log");
    append(&log, &["start"]);

    let mut poll_loop = poll_loop(temp_dir.path());
    let mut sink = RecordingSink::new();
    for i in 0..5 {
        append(&log, &[format!("line {i}").as_str()]);
        poll_loop.poll_once(&mut sink).await;
    }

    assert_eq!(sink.discoveries("grow.log"), 1);
    assert!(matches!(
        sink.kinds()[0],
        WatchEventKind::FileDiscovered { .. }
    ));
}

#[tokio::test]
async fn test_deleted_file_is_removed_once() {
    let temp_dir = TempDir::new().unwrap();
    let log = temp_dir.path().join("short-lived.log");
    append(&log, &["hello"]);

    let mut poll_loop = poll_loop(temp_dir.path());
    let mut sink = RecordingSink::new();
    poll_loop.poll_once(&mut sink).await;
    assert!(poll_loop.history().contains(&log));

    std::fs::remove_file(&log).unwrap();
    for _ in 0..3 {
        poll_loop.poll_once(&mut sink).await;
    }

    assert_eq!(sink.removals(&log), 1);
    assert!(!poll_loop.history().contains(&log));
}

#[tokio::test]
async fn test_extension_filter_is_exclusive() {
    let temp_dir = TempDir::new().unwrap();
    let txt = temp_dir.path().join("a.txt");
    append(&txt, &["ERROR in a text file"]);

    let config = WatchConfig::new("ERROR")
        .with_directories([temp_dir.path()])
        .with_extension(".log")
        .with_missing_wait(Duration::ZERO);
    let mut poll_loop = PollLoop::new(config).unwrap();
    let mut sink = RecordingSink::new();

    for _ in 0..3 {
        append(&txt, &["ERROR again"]);
        poll_loop.poll_once(&mut sink).await;
    }

    assert!(sink.events().is_empty());
    assert!(poll_loop.history().is_empty());
}

#[tokio::test]
async fn test_missing_directory_is_survived() {
    let temp_dir = TempDir::new().unwrap();
    let missing: PathBuf = temp_dir.path().join("later");

    let mut poll_loop = poll_loop(&missing);
    let mut sink = RecordingSink::new();
    let report = poll_loop.poll_once(&mut sink).await;

    assert_eq!(report.failures, 0);
    assert!(report.outcomes[0].directory_missing);
    assert!(poll_loop.history().is_empty());
    assert_eq!(
        sink.kinds(),
        vec![&WatchEventKind::DirectoryMissing {
            path: missing.clone()
        }]
    );
    sink.take();

    assert_ok!(std::fs::create_dir(&missing));
    append(&missing.join("app.log"), &["ERROR"]);
    poll_loop.poll_once(&mut sink).await;
    assert_eq!(sink.discoveries("app.log"), 1);
    assert_eq!(sink.match_lines("app.log"), vec![1]);
}

#[tokio::test]
async fn test_multiple_directories_share_one_history() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    append(&first.path().join("a.log"), &["ERROR a"]);
    append(&second.path().join("b.log"), &["ERROR b"]);

    let config = WatchConfig::new("ERROR")
        .with_directories([first.path(), second.path()])
        .with_missing_wait(Duration::ZERO);
    let mut poll_loop = PollLoop::new(config).unwrap();
    let mut sink = RecordingSink::new();

    poll_loop.poll_once(&mut sink).await;
    poll_loop.poll_once(&mut sink).await;

    assert_eq!(poll_loop.history().len(), 2);
    assert_eq!(sink.discoveries("a.log"), 1);
    assert_eq!(sink.discoveries("b.log"), 1);
    assert!(
        !sink
            .kinds()
            .iter()
            .any(|k| matches!(k, WatchEventKind::FileRemoved { .. }))
    );
}
