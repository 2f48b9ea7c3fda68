//! Temporary files and name sequences for sorts
//!
//! Spill files are `tempfile::NamedTempFile`s, so a run that is never closed
//! explicitly is still removed when dropped. Names carry the session id and a
//! sequence number from an injected `SequenceGenerator`.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tempfile::NamedTempFile;
use uuid::Uuid;

/// Monotonic counter for temp file and temp tree names
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    next: AtomicU64,
}

impl SequenceGenerator {
    /// Counter starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter starting at `start`
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Take the next value
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Source of temporary files for spill runs
pub trait TempFileProvider: Send + Sync {
    /// Create a new empty file that is removed when the handle drops
    fn create(&self) -> io::Result<NamedTempFile>;
}

/// Creates `sort-<session>-<seq>-*.tmp` files in one directory
#[derive(Debug, Clone)]
pub struct DirTempFileProvider {
    dir: PathBuf,
    session: Uuid,
    sequence: Arc<SequenceGenerator>,
}

impl DirTempFileProvider {
    pub fn new(dir: impl Into<PathBuf>, session: Uuid, sequence: Arc<SequenceGenerator>) -> Self {
        Self {
            dir: dir.into(),
            session,
            sequence,
        }
    }

    /// Directory files are created in
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl TempFileProvider for DirTempFileProvider {
    fn create(&self) -> io::Result<NamedTempFile> {
        let prefix = format!("sort-{}-{}-", self.session, self.sequence.next());
        tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(&self.dir)
    }
}
