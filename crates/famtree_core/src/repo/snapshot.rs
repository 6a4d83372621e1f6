//! Snapshot backend contract and shared load/save helpers.

use crate::db::DbError;
use log::{error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Instant;

/// Result type used by snapshot backends.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Storage-level failure while reading or writing a snapshot.
#[derive(Debug)]
pub enum SnapshotError {
    /// Filesystem failure on `path`.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// SQLite open, migration or slot failure.
    Db(DbError),
    /// In-memory state could not be serialized.
    Encode(serde_json::Error),
    /// Stored document is not a valid snapshot.
    Decode(serde_json::Error),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "snapshot io failed at `{}`: {source}", path.display())
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "snapshot encode failed: {err}"),
            Self::Decode(err) => write!(f, "snapshot decode failed: {err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Decode(err) => Some(err),
        }
    }
}

impl From<DbError> for SnapshotError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Durable medium holding exactly one serialized document.
pub trait SnapshotBackend {
    /// Stable label used in log events.
    fn kind(&self) -> &'static str;
    /// Reads the stored document. `Ok(None)` when nothing was persisted yet.
    fn read(&self) -> SnapshotResult<Option<String>>;
    /// Replaces the stored document as a whole.
    fn write(&self, document: &str) -> SnapshotResult<()>;
}

/// Loads and decodes a snapshot, degrading to `T::default()` on any failure.
///
/// # Side effects
/// - Emits `snapshot_load` events; failures are logged, never returned.
pub fn load_or_default<T>(backend: &dyn SnapshotBackend, store: &'static str) -> T
where
    T: DeserializeOwned + Default,
{
    let started_at = Instant::now();
    let document = match backend.read() {
        Ok(Some(document)) => document,
        Ok(None) => {
            info!(
                "event=snapshot_load module=repo status=empty store={store} backend={}",
                backend.kind()
            );
            return T::default();
        }
        Err(err) => {
            error!(
                "event=snapshot_load module=repo status=error store={store} backend={} error_code=read_failed error={err}",
                backend.kind()
            );
            return T::default();
        }
    };

    match serde_json::from_str::<T>(&document) {
        Ok(value) => {
            info!(
                "event=snapshot_load module=repo status=ok store={store} backend={} bytes={} duration_ms={}",
                backend.kind(),
                document.len(),
                started_at.elapsed().as_millis()
            );
            value
        }
        Err(err) => {
            warn!(
                "event=snapshot_load module=repo status=error store={store} backend={} error_code=decode_failed error={}",
                backend.kind(),
                SnapshotError::Decode(err)
            );
            T::default()
        }
    }
}

/// Encodes `value` and replaces the stored snapshot.
///
/// # Side effects
/// - Emits `snapshot_save` events with duration and status.
pub fn save<T>(backend: &dyn SnapshotBackend, store: &'static str, value: &T) -> SnapshotResult<()>
where
    T: Serialize,
{
    let started_at = Instant::now();
    let result = serde_json::to_string_pretty(value)
        .map_err(SnapshotError::Encode)
        .and_then(|document| backend.write(&document).map(|()| document.len()));

    match result {
        Ok(bytes) => {
            info!(
                "event=snapshot_save module=repo status=ok store={store} backend={} bytes={bytes} duration_ms={}",
                backend.kind(),
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err(err) => {
            error!(
                "event=snapshot_save module=repo status=error store={store} backend={} duration_ms={} error={err}",
                backend.kind(),
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}
