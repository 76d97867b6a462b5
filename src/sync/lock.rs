//! Sync pass lock
//!
//! One sync pass at a time per workspace. The lock is a file under
//! `.silan/` held exclusively for the duration of the pass; a second
//! process fails fast instead of queueing behind a long pass.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{Result, SyncError};

/// Exclusive lock held for the lifetime of a sync pass
#[derive(Debug)]
pub struct SyncLock {
    file: File,
    path: PathBuf,
}

impl SyncLock {
    /// Acquires the lock, failing immediately if another pass holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(path)
            .map_err(|e| SyncError::fs(path, &e))?;

        file.try_lock_exclusive()
            .map_err(|_| SyncError::LockHeld(path.to_path_buf()))?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        // Unlock errors at teardown have no recovery path.
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_acquire_fails_while_held() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sync.lock");

        let held = SyncLock::acquire(&path).unwrap();
        let err = SyncLock::acquire(&path).unwrap_err();
        assert!(matches!(err, SyncError::LockHeld(_)));

        drop(held);
        assert!(SyncLock::acquire(&path).is_ok());
    }
}
