//! # Data Directory Locking
//!
//! Two validator clients sharing one protection database would each see only
//! their own pending writes, so both could sign conflicting messages. The
//! data directory is therefore locked exclusively for the life of the store.
//!
//! Uses `fs2` for cross-platform file locking (flock on Unix, LockFile on Windows).

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

/// Errors from data directory locking.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("failed to create lock file: {0}")]
    CreateFailed(#[source] io::Error),

    #[error("validator database already in use{} ({})", .pid.map(|p| format!(" by process {p}")).unwrap_or_default(), .path.display())]
    AlreadyLocked { pid: Option<u32>, path: PathBuf },

    #[error("failed to write PID to lock file: {0}")]
    WriteFailed(#[source] io::Error),
}

/// Exclusive lock on a data directory, released on drop.
pub struct DatabaseLock {
    file: File,
    path: PathBuf,
    pid: u32,
}

impl DatabaseLock {
    const LOCK_FILE: &'static str = "LOCK";

    /// Acquire an exclusive lock on `data_dir` without blocking.
    ///
    /// # Errors
    ///
    /// Returns `LockError::AlreadyLocked` if another process holds the lock.
    pub fn acquire(data_dir: &Path) -> Result<Self, LockError> {
        let lock_path = data_dir.join(Self::LOCK_FILE);

        // Do not truncate before locking: the holder's PID must stay readable.
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(LockError::CreateFailed)?;

        if file.try_lock_exclusive().is_err() {
            return Err(LockError::AlreadyLocked {
                pid: Self::read_existing_pid(&lock_path),
                path: lock_path,
            });
        }

        let pid = std::process::id();
        file.set_len(0).map_err(LockError::WriteFailed)?;
        writeln!(file, "{}", pid).map_err(LockError::WriteFailed)?;
        file.sync_all().map_err(LockError::WriteFailed)?;

        tracing::debug!(path = %lock_path.display(), pid, "[qc-18] Acquired data directory lock");

        Ok(Self {
            file,
            path: lock_path,
            pid,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_existing_pid(path: &Path) -> Option<u32> {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }
}

impl Drop for DatabaseLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = std::fs::remove_file(&self.path);
    }
}
