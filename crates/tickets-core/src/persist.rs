//! Persistence adapters.
//!
//! The core only needs a byte-level load/save pair ([`SnapshotStore`]).
//! [`FileStore`] keeps the snapshot in a JSON file; [`MemoryStore`] keeps it
//! in memory for tests and embedding.
//!
//! Loading never fails: a missing snapshot seeds the default household, and
//! an unreadable or malformed one is logged and replaced by the seed.

use crate::calendar;
use crate::codec;
use crate::error::ErrorCode;
use crate::lock::{LockError, StateLock};
use crate::seed;
use crate::store::StateStore;
use chrono::{DateTime, TimeDelta, TimeZone};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Failures while reading or writing a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state file I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } | Self::Encode(_) => ErrorCode::SnapshotWriteFailed,
            Self::Lock(err) => err.code(),
        }
    }
}

/// A key-value slot holding one serialized snapshot.
pub trait SnapshotStore {
    /// The stored bytes, or `None` when nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Backend read failures.
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the stored bytes.
    ///
    /// # Errors
    ///
    /// Backend write failures.
    fn save(&mut self, bytes: &[u8]) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process snapshot slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    bytes: Option<Vec<u8>>,
    saves: usize,
}

impl MemoryStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: None,
            saves: 0,
        }
    }

    /// A slot that already holds `bytes`.
    #[must_use]
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Some(bytes.into()),
            saves: 0,
        }
    }

    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    /// How many times [`SnapshotStore::save`] was called.
    #[must_use]
    pub const fn saves(&self) -> usize {
        self.saves
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.bytes.clone())
    }

    fn save(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        self.bytes = Some(bytes.to_vec());
        self.saves += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// Snapshot kept in a JSON file.
///
/// Saves write a sibling `.tmp` file and rename it over the target while
/// holding an exclusive lock on a sibling `.lock` file, so a reader never
/// sees a half-written snapshot. Concurrent writers are last-writer-wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    lock_timeout: Duration,
}

impl FileStore {
    pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: Self::DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn save(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        let lock = StateLock::acquire(&self.path, self.lock_timeout)?;
        let tmp = self.sibling(".tmp");
        fs::write(&tmp, bytes).map_err(|err| self.io_error(err))?;
        if let Err(err) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_error(err));
        }
        lock.release();
        debug!(path = %self.path.display(), bytes = bytes.len(), "state saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Load / save pipeline
// ---------------------------------------------------------------------------

/// Load the snapshot from `store`, falling back to the default household.
///
/// With a `retention` window, completions and redemptions older than
/// `now - retention` are discarded.
pub fn load_state<S, Tz>(store: &S, retention: Option<TimeDelta>, now: &DateTime<Tz>) -> StateStore
where
    S: SnapshotStore + ?Sized,
    Tz: TimeZone,
{
    let bytes = match store.load() {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            info!("no stored state; starting from the default household");
            return seed::default_state();
        }
        Err(err) => {
            warn!(code = %err.code(), %err, "failed to read stored state; using the default household");
            return seed::default_state();
        }
    };

    let decoded = match codec::decode(&bytes) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!(
                code = %ErrorCode::CorruptSnapshot,
                %err,
                "stored state is malformed; using the default household"
            );
            return seed::default_state();
        }
    };
    if decoded.dangling_assignments > 0 {
        warn!(
            dropped = decoded.dangling_assignments,
            "dropped assignments to tasks that no longer exist"
        );
    }

    let mut state = decoded.state;
    if let Some(window) = retention {
        // A window reaching past the representable range keeps everything.
        if let Some(cutoff) = calendar::stamp(now).checked_sub_signed(window) {
            let discarded = state.discard_before(&cutoff);
            if discarded > 0 {
                debug!(discarded, %cutoff, "discarded events outside the retention window");
            }
        }
    }
    state
}

/// Encode and save `state`.
///
/// # Errors
///
/// Encoding or backend failures. Callers on the transition path log and
/// swallow these.
pub fn save_state<S>(store: &mut S, state: &StateStore) -> Result<(), StoreError>
where
    S: SnapshotStore + ?Sized,
{
    let bytes = codec::encode(state)?;
    store.save(&bytes)
}
