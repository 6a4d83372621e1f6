//! SQLite snapshot backend.
//!
//! # Responsibility
//! - Store one JSON document per `slot` row in a SQLite file.
//!
//! # Invariants
//! - Replacement happens inside one transaction.
//! - Reading never creates the database file.

use crate::db::{open_db, DbError};
use crate::repo::snapshot::{SnapshotBackend, SnapshotResult};
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use std::path::PathBuf;

/// Snapshot backend storing the document in a `snapshots` table row.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    path: PathBuf,
    slot: &'static str,
}

impl SqliteBackend {
    pub fn new(path: impl Into<PathBuf>, slot: &'static str) -> Self {
        Self {
            path: path.into(),
            slot,
        }
    }

    fn slot_error(&self, source: rusqlite::Error) -> DbError {
        DbError::Slot {
            slot: self.slot,
            source,
        }
    }
}

impl SnapshotBackend for SqliteBackend {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    fn read(&self) -> SnapshotResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let conn = open_db(&self.path)?;
        let document = conn
            .query_row(
                "SELECT document FROM snapshots WHERE slot = ?1;",
                [self.slot],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|source| self.slot_error(source))?;
        Ok(document)
    }

    fn write(&self, document: &str) -> SnapshotResult<()> {
        let mut conn = open_db(&self.path)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|source| self.slot_error(source))?;
        tx.execute(
            "INSERT INTO snapshots (slot, document, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(slot) DO UPDATE SET
                 document = excluded.document,
                 updated_at = excluded.updated_at;",
            params![self.slot, document],
        )
        .map_err(|source| self.slot_error(source))?;
        tx.commit().map_err(|source| self.slot_error(source))?;
        Ok(())
    }
}
