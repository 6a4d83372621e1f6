//! Credential store for the sign-in gate.
//!
//! # Responsibility
//! - Keep the username -> password mapping and answer verification queries.
//! - Persist the whole mapping after every registration.
//!
//! # Invariants
//! - Passwords are stored and compared as cleartext strings. This matches the
//!   persisted format and is a known security weakness, not a hardened auth
//!   scheme.
//! - Entries are only inserted or overwritten, never removed.
//! - Usernames are keys exactly as typed; lookups never trim or fold case.
//! - Usernames and passwords never appear in log events.

use crate::model::person::ValidationError;
use crate::repo::snapshot::{self, SnapshotBackend, SnapshotResult};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const STORE_LABEL: &str = "credentials";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialSnapshot {
    #[serde(default)]
    users: BTreeMap<String, String>,
}

/// Username/password mapping backed by a whole-structure snapshot.
pub struct CredentialStore {
    users: BTreeMap<String, String>,
    backend: Box<dyn SnapshotBackend>,
}

impl CredentialStore {
    /// Loads credentials from `backend`, starting empty on any read failure.
    pub fn open(backend: Box<dyn SnapshotBackend>) -> Self {
        let snapshot: CredentialSnapshot =
            snapshot::load_or_default(backend.as_ref(), STORE_LABEL);
        info!(
            "event=credentials_open module=auth status=ok users={}",
            snapshot.users.len()
        );
        Self {
            users: snapshot.users,
            backend,
        }
    }

    /// Returns true iff `username` is registered with exactly `password`.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|stored| stored == password)
    }

    /// Inserts or overwrites the password for `username`, then persists.
    ///
    /// # Errors
    /// - `ValidationError` when `username` is blank. Non-blank usernames are
    ///   stored verbatim, surrounding whitespace included.
    pub fn register(&mut self, username: &str, password: &str) -> Result<(), ValidationError> {
        if username.trim().is_empty() {
            return Err(ValidationError::BlankField("username"));
        }
        let replaced = self
            .users
            .insert(username.to_string(), password.to_string())
            .is_some();
        info!("event=credentials_register module=auth status=ok replaced={replaced}");
        if self.save().is_err() {
            warn!("event=credentials_commit module=auth status=degraded reason=persist_failed");
        }
        Ok(())
    }

    pub fn contains_user(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Writes the current mapping to the backend.
    pub fn save(&self) -> SnapshotResult<()> {
        let snapshot = CredentialSnapshot {
            users: self.users.clone(),
        };
        snapshot::save(self.backend.as_ref(), STORE_LABEL, &snapshot)
    }
}
