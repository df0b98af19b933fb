//! File access: the only place the store touches bytes on disk.
//!
//! [`OsFs`] talks to the real file system. [`MemFs`] keeps files in memory,
//! handy for tests and for embedding a store without touching disk.
//!
//! The store never creates directories, appends, or streams. It reads the
//! whole file once on open and overwrites it in full on every mutation.

use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Whole-file read/write capability.
pub trait FileAccess: Send + Sync + std::fmt::Debug {
    /// Read the entire file. Missing or unreadable files are [`Error::Io`].
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Replace the entire file with `bytes`.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;
}

// ---- OS file system ------------------------------------------------------

/// The real file system. Writes go to `<path>.tmp` first and are renamed over
/// `path`, so a crash mid-write leaves the previous content intact.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl FileAccess for OsFs {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path)
            .map_err(|e| Error::Io(format!("reading {}: {e}", path.display())))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        atomic_write(path, bytes)
    }
}

/// Write `bytes` to `<path>.tmp` and then rename over `path`.
///
/// The rename is close to atomic on most platforms; on FAT32 or network
/// shares there are no hard guarantees.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("data");
    let tmp = path.with_extension(format!("{ext}.tmp"));
    std::fs::write(&tmp, bytes)
        .map_err(|e| Error::Io(format!("writing {}: {e}", tmp.display())))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| Error::Io(format!("renaming onto {}: {e}", path.display())))?;
    Ok(())
}

// ---- in-memory file system -----------------------------------------------

/// In-memory file system keyed by normalized path (`./a.json` and `a.json`
/// are the same file).
///
/// Writes can be switched to fail with [`fail_writes`](Self::fail_writes),
/// which is how the tests exercise the "memory and disk diverge" path.
#[derive(Debug, Default)]
pub struct MemFs {
    files: RwLock<HashMap<PathBuf, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemFs {
    /// Empty file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a file. Doesn't count as a store write.
    pub fn insert(&self, path: impl AsRef<Path>, bytes: impl Into<Vec<u8>>) {
        self.files
            .write()
            .insert(normalize(path.as_ref()), bytes.into());
    }

    /// Current bytes of a file, if it exists.
    #[must_use]
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.read().get(&normalize(path.as_ref())).cloned()
    }

    /// `true` if the file exists.
    #[must_use]
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.files.read().contains_key(&normalize(path.as_ref()))
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl FileAccess for MemFs {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .read()
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| Error::Io(format!("{}: no such file", path.display())))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Io(format!("{}: write refused", path.display())));
        }
        self.files.write().insert(normalize(path), bytes.to_vec());
        Ok(())
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
