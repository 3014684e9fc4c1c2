//! Incremental keyword scanning of a single file.

use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::error::{Result, WatcherError};
use crate::event::{EventSink, WatchEvent, WatchEventKind};
use crate::history::{FileRecord, History};

/// What a call to [`scan_file`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Size matched the recorded size; nothing was read.
    Unchanged,

    /// The file was read.
    Scanned {
        /// Whether this was the first time the file was seen.
        discovered: bool,

        /// Number of new lines containing the keyword.
        matches: usize,
    },
}

/// Scan `path` for `keyword`, starting after the last line recorded in
/// `history`.
///
/// A tracked file whose size has not changed is skipped without being opened.
/// Otherwise the file is read and every line numbered above
/// [`FileRecord::last_scanned_line`] that contains the keyword is reported to
/// `sink`, preceded by a discovery event when the file was not tracked yet.
///
/// An unterminated final line without the keyword is not counted as scanned,
/// so it is inspected again after the writer completes it. One that already
/// contains the keyword is reported once and counted.
///
/// If the file disappears before it can be read, [`WatcherError::FileVanished`]
/// is returned and `history` is left as it was.
pub async fn scan_file(
    path: &Path,
    keyword: &str,
    history: &mut History,
    sink: &mut dyn EventSink,
) -> Result<ScanOutcome> {
    let probe = fs::metadata(path)
        .await
        .map_err(|e| WatcherError::from_file_io(path.to_path_buf(), e))?;

    let previous = history.get(path).copied();
    if previous.is_some_and(|record| record.last_known_size == probe.len()) {
        return Ok(ScanOutcome::Unchanged);
    }

    debug!("Scanning {} for {keyword}", path.display());

    let file = File::open(path)
        .await
        .map_err(|e| WatcherError::from_file_io(path.to_path_buf(), e))?;
    let size = file.metadata().await?.len();

    let name = file_name(path);
    let directory = parent_dir(path);

    if previous.is_none() {
        sink.emit(WatchEvent::new(WatchEventKind::FileDiscovered {
            name: name.clone(),
            directory: directory.clone(),
        }));
    }

    let last_scanned = previous.map_or(0, |record| record.last_scanned_line);
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut line: u64 = 0;
    let mut matches = 0;
    let mut pending_tail = false;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| WatcherError::from_file_io(path.to_path_buf(), e))?;
        if read == 0 {
            break;
        }
        line += 1;

        if line <= last_scanned {
            continue;
        }
        if line_contains(&buf, keyword) {
            matches += 1;
            sink.emit(WatchEvent::new(WatchEventKind::MatchFound {
                keyword: keyword.to_string(),
                name: name.clone(),
                directory: directory.clone(),
                line,
            }));
        } else if buf.last() != Some(&b'\n') {
            // Only the final line can be unterminated. Leave it unscanned so the
            // rest of it is checked once the writer finishes it.
            pending_tail = true;
        }
    }

    let scanned_through = if pending_tail { line - 1 } else { line };
    history.put(path, FileRecord::new(scanned_through, size));

    Ok(ScanOutcome::Scanned {
        discovered: previous.is_none(),
        matches,
    })
}

fn line_contains(raw: &[u8], keyword: &str) -> bool {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).contains(keyword)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}
