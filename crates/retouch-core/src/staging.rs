//! Best-effort staging of original uploads.
//!
//! The pipeline never reads staged blobs back; staging exists so originals
//! can be inspected after the fact. Implementations must be safe to call from
//! many requests at once.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::StagingError;

/// Where a blob ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedBlob {
    /// Written to this path
    File(PathBuf),
    /// Kept in memory under this name
    Memory(String),
    /// Staging is disabled; nothing was written
    Discarded,
}

/// Storage for original uploads.
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `name`.
    fn store(&self, bytes: &[u8], name: &str) -> Result<StagedBlob, StagingError>;
}

/// Build the staged name for an upload: `<unix-millis>-<original name>`.
///
/// Two uploads of the same name within the same millisecond collide; the
/// later one overwrites the earlier. That is acceptable for an audit copy
/// but is not a uniqueness guarantee.
pub fn staged_name(original_name: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{}-{}", millis, sanitize_name(original_name))
}

/// Reduce a client-supplied file name to one safe path component.
///
/// Directory parts are dropped, and anything that is not alphanumeric or one
/// of `.-_` is replaced with `_`. Empty and dot-only names become `upload`.
pub fn sanitize_name(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.chars().all(|c| c == '.') {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Writes blobs into a directory, creating it on first use.
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl BlobStore for FsBlobStore {
    fn store(&self, bytes: &[u8], name: &str) -> Result<StagedBlob, StagingError> {
        if name.is_empty() || name != sanitize_name(name) {
            return Err(StagingError::InvalidName(name.to_string()));
        }
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        std::fs::write(&path, bytes)?;
        tracing::trace!("Staged {} bytes at {:?}", bytes.len(), path);
        Ok(StagedBlob::File(path))
    }
}

/// Keeps blobs in memory. Handy for embedding and tests.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names stored so far, in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.blobs
            .lock()
            .map(|blobs| blobs.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    /// Bytes stored under `name`, if any.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        let blobs = self.blobs.lock().ok()?;
        blobs
            .iter()
            .rev()
            .find(|(stored, _)| stored == name)
            .map(|(_, bytes)| bytes.clone())
    }
}

impl BlobStore for MemoryBlobStore {
    fn store(&self, bytes: &[u8], name: &str) -> Result<StagedBlob, StagingError> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| StagingError::Io(std::io::Error::other("memory store poisoned")))?;
        blobs.push((name.to_string(), bytes.to_vec()));
        Ok(StagedBlob::Memory(name.to_string()))
    }
}

/// Accepts and drops everything. Used when staging is disabled.
pub struct NullBlobStore;

impl BlobStore for NullBlobStore {
    fn store(&self, _bytes: &[u8], _name: &str) -> Result<StagedBlob, StagingError> {
        Ok(StagedBlob::Discarded)
    }
}
