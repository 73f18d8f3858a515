// src/store/lock.rs

//! Advisory lock held by `forgeq run` on a file-backed store.
//!
//! The running process keeps the whole scheduler in memory and rewrites the
//! snapshot after every change, so a second writer would be overwritten.
//! One-shot mutating commands check the lock and refuse while it is held.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{ForgeqError, Result};

pub const LOCK_FILE: &str = "forgeq.lock";

pub fn lock_path(dir: &Path) -> PathBuf {
    dir.join(LOCK_FILE)
}

/// Whether a `run` process currently owns the store in `dir`.
pub fn is_locked(dir: &Path) -> bool {
    lock_path(dir).exists()
}

/// Fail with [`ForgeqError::StoreLocked`] if `dir` is locked.
pub fn ensure_unlocked(dir: &Path) -> Result<()> {
    let path = lock_path(dir);
    if path.exists() {
        return Err(ForgeqError::StoreLocked(path));
    }
    Ok(())
}

/// Lock file guard. The file is removed on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Create the lock file, failing if another process holds it.
    pub fn acquire(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = lock_path(dir);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ForgeqError::StoreLocked(path));
            }
            Err(e) => return Err(e.into()),
        };
        writeln!(file, "{}", std::process::id())?;

        debug!(path = ?path, "store lock acquired");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = ?self.path, "store lock released"),
            Err(e) => warn!(path = ?self.path, error = %e, "failed to release store lock"),
        }
    }
}
