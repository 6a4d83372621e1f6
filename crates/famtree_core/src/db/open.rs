//! Connection bootstrap for snapshot database files.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{debug, error};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite snapshot file and applies all pending migrations.
///
/// # Side effects
/// - Creates the file when it does not exist.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();

    let result = Connection::open(path)
        .and_then(|conn| conn.busy_timeout(BUSY_TIMEOUT).map(|()| conn))
        .map_err(|source| DbError::Open {
            path: path.to_path_buf(),
            source,
        })
        .and_then(|mut conn| apply_migrations(&mut conn).map(|()| conn));

    match &result {
        Ok(_) => debug!(
            "event=db_open module=db status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error duration_ms={} error_code={} error={err}",
            started_at.elapsed().as_millis(),
            error_code(err)
        ),
    }
    result
}

fn error_code(err: &DbError) -> &'static str {
    match err {
        DbError::Open { .. } => "db_open_failed",
        DbError::SchemaVersion(_) => "not_a_snapshot_db",
        DbError::Migration { .. } => "migration_failed",
        DbError::SchemaTooNew { .. } => "schema_too_new",
        DbError::Slot { .. } => "slot_failed",
    }
}
