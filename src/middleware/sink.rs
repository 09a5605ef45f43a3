//! Append-only destinations for access-log records.
//!
//! A record is one line. [`LogSink::append`] must write it as a unit: two
//! requests finishing at the same moment may land in either order, but never
//! with their characters mixed.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::info;

use crate::error::Error;

/// An append-only, line-oriented text destination shared by all requests.
pub trait LogSink: Send + Sync + 'static {
    /// Appends one record. `line` carries no trailing newline.
    fn append(&self, line: &str) -> io::Result<()>;
}

// ── File ─────────────────────────────────────────────────────────────────────

/// A log file held open for the life of the process.
///
/// Unbuffered: every record reaches the file in a single `write_all` while
/// holding the lock, so readers see whole lines and a failed append leaves
/// nothing behind to resurface with the next record.
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Opens (creating if needed) `path` for append. Missing parent
    /// directories are created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path)
            .map_err(|source| Error::SinkUnavailable { path: path.clone(), source })?;

        info!(path = %path.display(), "access log opened");
        Ok(Self { path, file: Mutex::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

impl LogSink for FileSink {
    fn append(&self, line: &str) -> io::Result<()> {
        let mut file = self.file
            .lock()
            .map_err(|_| io::Error::other("access log lock poisoned"))?;
        write_record(&mut *file, line)
    }
}

/// One record, newline included, in one `write_all`.
fn write_record<W: Write + ?Sized>(out: &mut W, line: &str) -> io::Result<()> {
    let mut record = String::with_capacity(line.len() + 1);
    record.push_str(line);
    record.push('\n');
    out.write_all(record.as_bytes())
}

// ── Stderr ───────────────────────────────────────────────────────────────────

/// Standard error. Used as the fallback when the primary sink fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrSink;

impl LogSink for StderrSink {
    fn append(&self, line: &str) -> io::Result<()> {
        // `Stderr` is unbuffered and its lock keeps the line in one piece.
        let mut err = io::stderr().lock();
        writeln!(err, "{line}")
    }
}

// ── Memory ───────────────────────────────────────────────────────────────────

/// Keeps records in memory. Handy in tests and for embedding.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record appended so far, in append order.
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl LogSink for MemorySink {
    fn append(&self, line: &str) -> io::Result<()> {
        self.lines
            .lock()
            .map_err(|_| io::Error::other("memory sink lock poisoned"))?
            .push(line.to_owned());
        Ok(())
    }
}
