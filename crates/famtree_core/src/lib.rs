//! Core domain logic for the family tree app.
//! This crate owns the tree, credential and session invariants; presentation
//! layers only issue commands and render results.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{BackendKind, ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::forest::{Forest, PersonView, Walk};
pub use model::person::{PersonId, PersonRecord, ValidationError};
pub use repo::json_file::JsonFileBackend;
pub use repo::snapshot::{SnapshotBackend, SnapshotError, SnapshotResult};
pub use repo::sqlite::SqliteBackend;
pub use service::credentials::CredentialStore;
pub use service::family_tree::{
    DeleteOutcome, FamilyTreeStore, TreeChange, TreeError, TreeListener, TreeResult,
};
pub use service::session::{Controls, Session, SessionError, SessionPolicy, SessionState};
