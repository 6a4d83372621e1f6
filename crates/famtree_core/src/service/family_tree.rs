//! Family tree store use-case service.
//!
//! # Responsibility
//! - Apply add/delete/edit/reset commands to the person forest.
//! - Persist the whole forest after every mutation.
//! - Notify subscribed listeners after every mutation.
//!
//! # Invariants
//! - Every root key equals the name of its node (roots are looked up by name).
//! - Failed validation or lookup leaves memory, storage and listeners untouched.
//! - A failed persist is logged and the in-memory mutation is kept.
//! - Delete/edit target only root names; their cascade reaches direct children
//!   of every root and nothing deeper.

use crate::model::forest::{Forest, PersonView};
use crate::model::person::{normalize_required, PersonId, PersonRecord, ValidationError};
use crate::repo::snapshot::{self, SnapshotBackend, SnapshotResult};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const STORE_LABEL: &str = "family_tree";

/// Persisted document shape for the family tree store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct TreeSnapshot {
    #[serde(default)]
    roots: Vec<PersonRecord>,
}

/// Result type used by family tree store operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// User-facing errors from family tree commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Required input is blank.
    Validation(ValidationError),
    /// No root is keyed by the given name.
    NotFound(String),
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(name) => write!(f, "person not found: {name}"),
        }
    }
}

impl Error for TreeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<ValidationError> for TreeError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Mutation applied to the store, delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeChange {
    /// A person was created, as a root when `parent` is `None`.
    Added {
        id: PersonId,
        parent: Option<PersonId>,
    },
    /// A root was removed along with `pruned_children` same-named children.
    Deleted { pruned_children: usize },
    /// A root was renamed along with `cascaded_children` direct children.
    Renamed {
        id: PersonId,
        cascaded_children: usize,
    },
    /// Every person was removed.
    Reset,
}

/// Observer notified after each committed mutation (re-render hook).
pub trait TreeListener {
    fn tree_changed(&mut self, change: &TreeChange, forest: &Forest);
}

/// Outcome of a delete request that passed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { pruned_children: usize },
    /// The caller declined the confirmation; nothing changed.
    Cancelled,
}

/// Name-keyed family tree backed by a whole-structure snapshot.
pub struct FamilyTreeStore {
    forest: Forest,
    backend: Box<dyn SnapshotBackend>,
    listeners: Vec<Box<dyn TreeListener>>,
}

impl FamilyTreeStore {
    /// Loads the store from `backend`.
    ///
    /// Missing or unreadable snapshots yield an empty store; the failure is
    /// logged and not returned.
    pub fn open(backend: Box<dyn SnapshotBackend>) -> Self {
        let snapshot: TreeSnapshot = snapshot::load_or_default(backend.as_ref(), STORE_LABEL);
        let forest = Forest::from_records(snapshot.roots);
        info!(
            "event=tree_open module=tree status=ok roots={} people={}",
            forest.root_count(),
            forest.len()
        );
        Self {
            forest,
            backend,
            listeners: Vec::new(),
        }
    }

    /// Read access to the whole forest.
    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    /// Root used by presentation layers as the drawing origin.
    pub fn display_root(&self) -> Option<PersonView<'_>> {
        self.forest.first_root()
    }

    /// Finds a person by name: roots first, then descendants in pre-order.
    pub fn find_by_name(&self, name: &str) -> Option<PersonView<'_>> {
        self.forest
            .find(name.trim())
            .and_then(|id| self.forest.get(id))
    }

    /// Registers a listener for post-mutation notifications.
    pub fn subscribe(&mut self, listener: Box<dyn TreeListener>) {
        self.listeners.push(listener);
    }

    /// Adds one person.
    ///
    /// When `parent_name` resolves anywhere in the tree, the person is
    /// appended as the last child of the first match. Otherwise the person
    /// becomes a root, replacing any root with the same name.
    ///
    /// # Errors
    /// - `TreeError::Validation` when `name` is blank.
    pub fn add_person(&mut self, name: &str, parent_name: &str) -> TreeResult<PersonId> {
        let name = normalize_required(name, "name")?;
        let parent_name = parent_name.trim();

        let parent = if parent_name.is_empty() {
            None
        } else {
            self.forest.find(parent_name)
        };

        let id = match parent.and_then(|parent| self.forest.append_child(parent, name.clone())) {
            Some(id) => id,
            None => self.forest.insert_root(name),
        };

        info!(
            "event=tree_add module=tree status=ok placement={} parent_requested={}",
            if parent.is_some() { "child" } else { "root" },
            !parent_name.is_empty()
        );
        self.commit(TreeChange::Added { id, parent });
        Ok(id)
    }

    /// Deletes the root keyed by `name` after the caller confirms.
    ///
    /// On confirmation, also removes every direct child of every remaining
    /// root whose name equals `name`.
    ///
    /// # Errors
    /// - `TreeError::NotFound` when no root is keyed by `name`, including when
    ///   `name` only exists as a nested descendant.
    pub fn delete_person(
        &mut self,
        name: &str,
        confirm: impl FnOnce(&str) -> bool,
    ) -> TreeResult<DeleteOutcome> {
        let name = name.trim();
        let id = self
            .forest
            .root_id(name)
            .ok_or_else(|| TreeError::NotFound(name.to_string()))?;

        if !confirm(name) {
            info!("event=tree_delete module=tree status=cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        self.forest.remove_root(id);
        let pruned_children = self.forest.prune_root_children_named(name);
        info!("event=tree_delete module=tree status=ok pruned_children={pruned_children}");
        self.commit(TreeChange::Deleted { pruned_children });
        Ok(DeleteOutcome::Deleted { pruned_children })
    }

    /// Renames the root keyed by `old_name` to `new_name`.
    ///
    /// Any other root already named `new_name` is replaced. Every direct
    /// child of every root named `old_name` is renamed as well.
    ///
    /// # Errors
    /// - `TreeError::NotFound` when no root is keyed by `old_name`.
    /// - `TreeError::Validation` when `new_name` is blank.
    pub fn edit_person(&mut self, old_name: &str, new_name: &str) -> TreeResult<PersonId> {
        let old_name = old_name.trim();
        let id = self
            .forest
            .root_id(old_name)
            .ok_or_else(|| TreeError::NotFound(old_name.to_string()))?;
        let new_name = normalize_required(new_name, "new name")?;

        self.forest.rename_root(id, new_name.clone());
        let cascaded_children = self.forest.rename_root_children_named(old_name, &new_name);
        info!("event=tree_edit module=tree status=ok cascaded_children={cascaded_children}");
        self.commit(TreeChange::Renamed {
            id,
            cascaded_children,
        });
        Ok(id)
    }

    /// Removes every person and persists the empty store.
    pub fn reset(&mut self) {
        let removed = self.forest.len();
        self.forest.clear();
        info!("event=tree_reset module=tree status=ok removed={removed}");
        self.commit(TreeChange::Reset);
    }

    /// Writes the current forest to the backend.
    ///
    /// Mutating commands call this implicitly and only log failures; call it
    /// directly to observe durability errors.
    pub fn save(&self) -> SnapshotResult<()> {
        let snapshot = TreeSnapshot {
            roots: self.forest.to_records(),
        };
        snapshot::save(self.backend.as_ref(), STORE_LABEL, &snapshot)
    }

    fn commit(&mut self, change: TreeChange) {
        if self.save().is_err() {
            warn!("event=tree_commit module=tree status=degraded reason=persist_failed");
        }
        for listener in &mut self.listeners {
            listener.tree_changed(&change, &self.forest);
        }
    }
}
