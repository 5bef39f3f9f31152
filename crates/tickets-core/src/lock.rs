//! Advisory lock guarding replacement of the state file.
//!
//! Writers take an exclusive `fs2` lock on a `.lock` file next to the
//! state file. Readers never lock: the rename in
//! [`FileStore::save`](crate::persist::FileStore) is atomic, so they see
//! either the old snapshot or the new one.

use crate::error::ErrorCode;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("{}: another tk is saving {} (waited {waited:?})", ErrorCode::LockContention.code(), path.display())]
    Timeout { path: PathBuf, waited: Duration },

    #[error("{}: cannot open lock file {}: {source}", ErrorCode::SnapshotWriteFailed.code(), path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::Open { .. } => ErrorCode::SnapshotWriteFailed,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// Held for the duration of one save. Unlocks on drop.
#[derive(Debug)]
pub struct StateLock {
    file: File,
    path: PathBuf,
}

impl StateLock {
    /// The lock file used for `state_path`: `<state_path>.lock`.
    #[must_use]
    pub fn path_for(state_path: &Path) -> PathBuf {
        let mut name = state_path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        state_path.with_file_name(name)
    }

    /// Lock `state_path` for writing, retrying until `timeout` has passed.
    ///
    /// Creates the state file's directory when it does not exist yet.
    ///
    /// # Errors
    ///
    /// [`LockError::Timeout`] when another writer keeps the lock, or
    /// [`LockError::Open`] when the lock file cannot be created.
    pub fn acquire(state_path: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = Self::path_for(state_path);
        let open_error = |source| LockError::Open {
            path: path.clone(),
            source,
        };
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(open_error)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(open_error)?;

        let started = Instant::now();
        while file.try_lock_exclusive().is_err() {
            let waited = started.elapsed();
            if waited >= timeout {
                return Err(LockError::Timeout { path, waited });
            }
            thread::sleep(POLL_INTERVAL);
        }
        Ok(Self { file, path })
    }

    /// The lock file this guard holds.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(self) {
        drop(self);
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tempfile::TempDir;

    #[test]
    fn lock_file_sits_next_to_state() {
        assert_eq!(
            StateLock::path_for(Path::new("/data/tickets/state.json")),
            PathBuf::from("/data/tickets/state.json.lock")
        );
    }

    #[test]
    fn acquire_creates_directory_and_lock_file() {
        let dir = TempDir::new().expect("tempdir");
        let state = dir.path().join("household/state.json");
        let lock = StateLock::acquire(&state, Duration::from_millis(50)).expect("lock");
        assert!(lock.path().exists());
        assert!(!state.exists());
    }

    #[test]
    fn second_writer_times_out() {
        let dir = TempDir::new().expect("tempdir");
        let state = dir.path().join("state.json");
        let _held = StateLock::acquire(&state, Duration::from_millis(50)).expect("first");

        let err = StateLock::acquire(&state, Duration::from_millis(20)).expect_err("contended");
        assert_eq!(err.code(), ErrorCode::LockContention);
        assert!(err.hint().is_some());
        assert!(err.to_string().starts_with("E5002"));
    }

    #[test]
    fn waiting_writer_gets_lock_once_released() {
        let dir = TempDir::new().expect("tempdir");
        let state = dir.path().join("state.json");
        let held = StateLock::acquire(&state, Duration::from_millis(50)).expect("first");

        let (tx, rx) = mpsc::channel();
        let waiter_state = state.clone();
        let waiter = thread::spawn(move || {
            tx.send(()).expect("signal");
            StateLock::acquire(&waiter_state, Duration::from_secs(5)).map(|_| ())
        });
        rx.recv().expect("waiter started");
        thread::sleep(Duration::from_millis(30));
        held.release();

        assert!(waiter.join().expect("waiter thread").is_ok());
    }
}
