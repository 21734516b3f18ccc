//! Flat-file store adapter.
//!
//! One data directory, one file per store name, plain text lines. The
//! format is crash-safe by construction:
//! - a complete line always decodes on its own
//! - a partial line (from a write interrupted by power loss) has no
//!   terminator, so the read side drops it before the codec ever sees it
//!
//! No fsync per append: the write-through keeps the file current, and
//! the periodic snapshot rewrite repairs anything a crash garbled.

use std::fs::{self, File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use log::warn;

use crate::app::ports::{StoreError, StorePort};
use crate::records::Line;

/// Split raw store bytes into complete lines.
///
/// `split('\n')` always yields a final element: after a trailing
/// terminator it is empty, otherwise it is the unterminated fragment of
/// an interrupted append. Dropped either way. A `\r` left by CRLF
/// writers is stripped.
pub fn complete_lines(raw: &str) -> Vec<String> {
    let mut lines: Vec<String> = raw
        .split('\n')
        .map(|l| l.trim_end_matches('\r').to_string())
        .collect();
    lines.pop();
    lines
}

/// Line-oriented store over a flat directory.
pub struct FileStore {
    /// Data directory; `None` when the device never came up.
    root: Option<PathBuf>,
}

impl FileStore {
    /// Open the data directory, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self { root: Some(dir.to_path_buf()) })
    }

    /// A store with no device behind it: every operation reports
    /// [`StoreError::Unavailable`] and changes nothing. The server
    /// keeps running memory-only instead of refusing to boot.
    pub fn unavailable() -> Self {
        Self { root: None }
    }

    fn path(&self, store: &str) -> Result<PathBuf, StoreError> {
        self.root
            .as_ref()
            .map(|root| root.join(store))
            .ok_or(StoreError::Unavailable)
    }
}

fn io_fail(op: &str, store: &str, e: &std::io::Error) -> StoreError {
    warn!("store: {} {} failed: {}", op, store, e);
    StoreError::Io
}

impl StorePort for FileStore {
    fn append(&mut self, store: &str, line: &str) -> Result<(), StoreError> {
        let path = self.path(store)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| io_fail("open", store, &e))?;
        writeln!(file, "{}", line).map_err(|e| io_fail("append", store, &e))
    }

    fn read_all(&self, store: &str) -> Result<Vec<String>, StoreError> {
        let path = self.path(store)?;
        match fs::read(&path) {
            // Lossy decode: a corrupted row becomes a garbage line the
            // codec skips, instead of poisoning the whole store.
            Ok(raw) => Ok(complete_lines(&String::from_utf8_lossy(&raw))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(io_fail("read", store, &e)),
        }
    }

    fn rewrite(&mut self, store: &str, lines: &[Line]) -> Result<(), StoreError> {
        let path = self.path(store)?;
        let mut file = File::create(&path).map_err(|e| io_fail("create", store, &e))?;
        for line in lines {
            writeln!(file, "{}", line).map_err(|e| io_fail("rewrite", store, &e))?;
        }
        Ok(())
    }

    fn exists(&self, store: &str) -> bool {
        match self.path(store) {
            Ok(path) => path.exists(),
            Err(_) => false,
        }
    }
}
