//! Index snapshot persistence
//!
//! `IndexStore` is the seam between the corpus facade and wherever snapshots
//! live. Every failure here is a `CacheError`, which the facade logs and
//! treats as a miss; a broken cache costs a rescan, never a failed call.
//!
//! Staleness rules for the file store:
//! - the cache file's mtime is older than the source's: delete it, miss
//! - the snapshot's captured source mtime is older than the source's: miss
//! - the format version differs: miss
//!
//! Writers are not coordinated. Two processes storing the same path race
//! and the last rename wins; the temp-file-then-rename write keeps either
//! result readable.

use super::snapshot::{BoundaryRecord, IndexSnapshot};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;
use thiserror::Error;
use tracing::debug;

/// Bumped whenever the serialized layout changes
pub const FORMAT_VERSION: u32 = 1;

/// Snapshot persistence failure; never surfaced to corpus callers
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt cache file: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Where index snapshots are loaded from and stored to
pub trait IndexStore: Send + Sync {
    /// Load a snapshot that is still valid for `source`, or None
    fn load(&self, source: &Path) -> Result<Option<IndexSnapshot>, CacheError>;

    /// Persist a snapshot captured from `source`
    fn store(&self, source: &Path, snapshot: &IndexSnapshot) -> Result<(), CacheError>;
}

/// Modification time of a file
pub fn modified(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

#[derive(Serialize)]
struct SnapshotFileRef<'a> {
    format_version: u32,
    source_mtime: SystemTime,
    records: &'a [BoundaryRecord],
}

#[derive(Deserialize)]
struct SnapshotFile {
    format_version: u32,
    source_mtime: SystemTime,
    records: Vec<BoundaryRecord>,
}

/// Serialize a snapshot to the cache format
pub fn encode(snapshot: &IndexSnapshot) -> Result<Vec<u8>, CacheError> {
    serde_json::to_vec(&SnapshotFileRef {
        format_version: FORMAT_VERSION,
        source_mtime: snapshot.source_mtime(),
        records: snapshot.records(),
    })
    .map_err(CacheError::Serialize)
}

/// Deserialize the cache format; a foreign version decodes to None
pub fn decode(bytes: &[u8]) -> Result<Option<IndexSnapshot>, CacheError> {
    let file: SnapshotFile = serde_json::from_slice(bytes).map_err(CacheError::Corrupt)?;
    if file.format_version != FORMAT_VERSION {
        debug!(found = file.format_version, expected = FORMAT_VERSION, "cache format version mismatch");
        return Ok(None);
    }
    Ok(Some(IndexSnapshot::from_records(file.records, file.source_mtime)))
}

/// Snapshot stored in a file on disk
#[derive(Debug, Clone)]
pub struct FileIndexStore {
    path: PathBuf,
}

impl FileIndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileIndexStore { path: path.into() }
    }

    /// Store beside the source as `<source>.~`
    pub fn beside(source: &Path) -> Self {
        Self::new(crate::config::beside_path(source))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}.tmp", std::process::id()));
        PathBuf::from(name)
    }
}

impl IndexStore for FileIndexStore {
    fn load(&self, source: &Path) -> Result<Option<IndexSnapshot>, CacheError> {
        let cache_mtime = match modified(&self.path) {
            Ok(mtime) => mtime,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(cache = %self.path.display(), "no cache file");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let source_mtime = modified(source)?;

        if source_mtime > cache_mtime {
            debug!(cache = %self.path.display(), "source is newer than cache, removing it");
            if let Err(e) = fs::remove_file(&self.path) {
                debug!(error = %e, "could not remove stale cache");
            }
            return Ok(None);
        }

        let bytes = fs::read(&self.path)?;
        match decode(&bytes)? {
            Some(snapshot) if snapshot.source_mtime() >= source_mtime => Ok(Some(snapshot)),
            Some(_) => {
                debug!(cache = %self.path.display(), "snapshot captured before the last source change");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn store(&self, _source: &Path, snapshot: &IndexSnapshot) -> Result<(), CacheError> {
        let bytes = encode(snapshot)?;
        let temp = self.temp_path();

        let result = fs::write(&temp, &bytes).and_then(|_| fs::rename(&temp, &self.path));
        if let Err(e) = result {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        debug!(cache = %self.path.display(), bytes = bytes.len(), "stored index snapshot");
        Ok(())
    }
}

/// Snapshot held in memory, for tests and short-lived handles
#[derive(Debug, Default)]
pub struct MemoryIndexStore {
    snapshot: Mutex<Option<IndexSnapshot>>,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a snapshot already stored
    pub fn with_snapshot(snapshot: IndexSnapshot) -> Self {
        MemoryIndexStore {
            snapshot: Mutex::new(Some(snapshot)),
        }
    }

    /// Copy of the stored snapshot
    pub fn snapshot(&self) -> Option<IndexSnapshot> {
        self.snapshot.lock().ok().and_then(|guard| guard.clone())
    }
}

impl IndexStore for MemoryIndexStore {
    fn load(&self, source: &Path) -> Result<Option<IndexSnapshot>, CacheError> {
        let source_mtime = modified(source)?;
        Ok(self.snapshot().filter(|s| s.source_mtime() >= source_mtime))
    }

    fn store(&self, _source: &Path, snapshot: &IndexSnapshot) -> Result<(), CacheError> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| CacheError::Io(io::Error::other("memory store lock poisoned")))?;
        *guard = Some(snapshot.clone());
        Ok(())
    }
}

/// Store that never persists anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIndexStore;

impl IndexStore for NoopIndexStore {
    fn load(&self, _source: &Path) -> Result<Option<IndexSnapshot>, CacheError> {
        Ok(None)
    }

    fn store(&self, _source: &Path, _snapshot: &IndexSnapshot) -> Result<(), CacheError> {
        Ok(())
    }
}
