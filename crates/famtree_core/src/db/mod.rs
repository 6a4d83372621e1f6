//! SQLite files that hold store snapshots.
//!
//! # Responsibility
//! - Open snapshot files and bring their schema up to date.
//! - Attach the failing file, migration or slot to every SQLite error.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - The `snapshots` table is not touched before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::open_db;

pub type DbResult<T> = Result<T, DbError>;

/// SQLite failure with the snapshot context it happened in.
#[derive(Debug)]
pub enum DbError {
    /// The snapshot file could not be opened or configured.
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },
    /// `PRAGMA user_version` could not be read, usually because the file is
    /// not a SQLite database.
    SchemaVersion(rusqlite::Error),
    /// Applying migration `version` failed; the transaction was rolled back.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was written by a build with a newer snapshot schema.
    SchemaTooNew { file_version: u32, supported: u32 },
    /// Reading or replacing the document stored under `slot` failed.
    Slot {
        slot: &'static str,
        source: rusqlite::Error,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "cannot open snapshot file `{}`: {source}", path.display())
            }
            Self::SchemaVersion(source) => {
                write!(f, "cannot read snapshot schema version: {source}")
            }
            Self::Migration { version, source } => {
                write!(f, "snapshot migration {version} failed: {source}")
            }
            Self::SchemaTooNew {
                file_version,
                supported,
            } => write!(
                f,
                "snapshot schema version {file_version} is newer than supported {supported}"
            ),
            Self::Slot { slot, source } => write!(f, "snapshot slot `{slot}` failed: {source}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. }
            | Self::Migration { source, .. }
            | Self::Slot { source, .. } => Some(source),
            Self::SchemaVersion(source) => Some(source),
            Self::SchemaTooNew { .. } => None,
        }
    }
}
