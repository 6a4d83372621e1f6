//! Store configuration.
//!
//! # Responsibility
//! - Resolve where snapshots live and which backend writes them.
//! - Construct stores and sessions from one resolved configuration.
//!
//! # Invariants
//! - The tree, credential and session snapshots are independent files.
//! - Environment overrides are read once, at resolution time.

use crate::repo::json_file::JsonFileBackend;
use crate::repo::snapshot::SnapshotBackend;
use crate::repo::sqlite::SqliteBackend;
use crate::service::credentials::CredentialStore;
use crate::service::family_tree::FamilyTreeStore;
use crate::service::session::{Session, SessionPolicy};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

/// Directory holding both snapshot files.
pub const DATA_DIR_ENV: &str = "FAMTREE_DATA_DIR";
/// `json` or `sqlite`.
pub const BACKEND_ENV: &str = "FAMTREE_BACKEND";
/// Boolean toggle for `SessionPolicy::reset_tree_on_sign_in`.
pub const RESET_ON_SIGN_IN_ENV: &str = "FAMTREE_RESET_ON_SIGN_IN";

const TREE_FILE_STEM: &str = "familyTreeData";
const CREDENTIALS_FILE_STEM: &str = "userCredentials";
const SESSION_FILE_STEM: &str = "sessionState";
const TREE_SLOT: &str = "family_tree";
const CREDENTIALS_SLOT: &str = "credentials";
const SESSION_SLOT: &str = "session";

/// Durable medium used for both stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    JsonFile,
    Sqlite,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JsonFile => "json",
            Self::Sqlite => "sqlite",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::JsonFile => "json",
            Self::Sqlite => "sqlite3",
        }
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" | "json_file" => Ok(Self::JsonFile),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            other => Err(ConfigError::UnsupportedBackend(other.to_string())),
        }
    }
}

/// Configuration resolution errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedBackend(String),
    InvalidFlag { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedBackend(value) => {
                write!(f, "unsupported backend `{value}`; expected json|sqlite")
            }
            Self::InvalidFlag { key, value } => {
                write!(f, "invalid boolean `{value}` for {key}; expected true|false")
            }
        }
    }
}

impl Error for ConfigError {}

/// Resolved store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub backend: BackendKind,
    pub session: SessionPolicy,
}

impl StoreConfig {
    /// JSON snapshots in `data_dir` with the default session policy.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            backend: BackendKind::default(),
            session: SessionPolicy::default(),
        }
    }

    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup`, falling back to defaults
    /// for unset or blank keys. The default data directory is `.`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::new(read(DATA_DIR_ENV).unwrap_or_else(|| ".".to_string()));
        if let Some(backend) = read(BACKEND_ENV) {
            config.backend = backend.parse()?;
        }
        if let Some(flag) = read(RESET_ON_SIGN_IN_ENV) {
            config.session.reset_tree_on_sign_in = parse_flag(RESET_ON_SIGN_IN_ENV, &flag)?;
        }
        Ok(config)
    }

    pub fn tree_path(&self) -> PathBuf {
        self.data_dir.join(format!("{TREE_FILE_STEM}.{}", self.backend.extension()))
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{CREDENTIALS_FILE_STEM}.{}", self.backend.extension()))
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{SESSION_FILE_STEM}.{}", self.backend.extension()))
    }

    pub fn tree_backend(&self) -> Box<dyn SnapshotBackend> {
        self.backend_for(self.tree_path(), TREE_SLOT)
    }

    pub fn credentials_backend(&self) -> Box<dyn SnapshotBackend> {
        self.backend_for(self.credentials_path(), CREDENTIALS_SLOT)
    }

    pub fn session_backend(&self) -> Box<dyn SnapshotBackend> {
        self.backend_for(self.session_path(), SESSION_SLOT)
    }

    /// Loads the family tree store.
    pub fn open_family_tree(&self) -> FamilyTreeStore {
        FamilyTreeStore::open(self.tree_backend())
    }

    /// Loads the credential store.
    pub fn open_credentials(&self) -> CredentialStore {
        CredentialStore::open(self.credentials_backend())
    }

    /// Creates a signed-out, in-memory session with the configured policy.
    pub fn new_session(&self) -> Session {
        Session::new(self.session)
    }

    /// Restores the persisted session, checking its user against `credentials`.
    pub fn open_session(&self, credentials: &CredentialStore) -> Session {
        Session::restore(self.session, self.session_backend(), credentials)
    }

    fn backend_for(&self, path: PathBuf, slot: &'static str) -> Box<dyn SnapshotBackend> {
        match self.backend {
            BackendKind::JsonFile => Box::new(JsonFileBackend::new(path)),
            BackendKind::Sqlite => Box::new(SqliteBackend::new(path, slot)),
        }
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key,
            value: value.to_string(),
        }),
    }
}
