//! Person domain model.
//!
//! # Responsibility
//! - Define the stable identity used by the in-memory forest.
//! - Define the nested record shape written to snapshot backends.
//! - Normalize and validate user-entered names.
//!
//! # Invariants
//! - `PersonId` never changes across renames.
//! - A persisted `PersonRecord` owns its children; no parent back-reference.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one person node.
///
/// Names are mutable labels; structural identity is this id.
pub type PersonId = Uuid;

/// Validation failure for user-entered fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is empty or whitespace-only.
    BlankField(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
        }
    }
}

impl Error for ValidationError {}

/// Persisted shape of one person and its ordered descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    /// Stable node id. Missing ids are minted on load.
    #[serde(default = "Uuid::new_v4")]
    pub id: PersonId,
    /// Display name.
    pub name: String,
    /// Children in insertion order.
    #[serde(default)]
    pub children: Vec<PersonRecord>,
}

impl PersonRecord {
    /// Creates a childless record with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Appends one child and returns `self` for chained construction.
    pub fn with_child(mut self, child: PersonRecord) -> Self {
        self.children.push(child);
        self
    }
}

/// Trims `value` and rejects blank input for the named field.
pub fn normalize_required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(trimmed.to_string())
}
