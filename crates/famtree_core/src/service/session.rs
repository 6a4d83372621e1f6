//! Sign-in session state machine.
//!
//! # Responsibility
//! - Track `SignedOut -> SignedIn -> SignedOut` transitions.
//! - Report which command groups a presentation layer should enable.
//! - Optionally persist the signed-in username so short-lived front ends
//!   (one process per command) keep the gate closed between runs.
//!
//! # Invariants
//! - Entering `SignedIn` requires a successful credential check, or a restored
//!   username that is still registered.
//! - With `SessionPolicy::reset_tree_on_sign_in` (the default), a successful
//!   sign-in clears the family tree. This reproduces the legacy behavior and
//!   is a known defect; turn the policy off to keep data across sign-ins.

use crate::repo::snapshot::{self, SnapshotBackend};
use crate::service::credentials::CredentialStore;
use crate::service::family_tree::FamilyTreeStore;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

const STORE_LABEL: &str = "session";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionSnapshot {
    #[serde(default)]
    signed_in: Option<String>,
}

/// Side effects coupled to session transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Clear the family tree on every successful sign-in.
    pub reset_tree_on_sign_in: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            reset_tree_on_sign_in: true,
        }
    }
}

/// Current session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    SignedOut,
    SignedIn { username: String },
}

/// Command groups enabled for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    /// Add/delete/edit person commands.
    pub edit: bool,
    pub sign_in: bool,
    pub sign_up: bool,
    pub sign_out: bool,
}

/// Errors from session transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Unknown username or wrong password.
    InvalidCredentials,
    /// Sign-in attempted while a user is signed in.
    AlreadySignedIn,
    /// Operation requires a signed-in user.
    NotSignedIn,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::AlreadySignedIn => write!(f, "already signed in"),
            Self::NotSignedIn => write!(f, "not signed in"),
        }
    }
}

impl Error for SessionError {}

/// Session gate in front of the editing commands.
pub struct Session {
    state: SessionState,
    policy: SessionPolicy,
    backend: Option<Box<dyn SnapshotBackend>>,
}

impl Session {
    /// Creates a signed-out, in-memory session.
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            state: SessionState::SignedOut,
            policy,
            backend: None,
        }
    }

    /// Restores the last persisted state from `backend`.
    ///
    /// A stored username that is no longer registered restores as
    /// `SignedOut`. Restoring never resets the tree.
    pub fn restore(
        policy: SessionPolicy,
        backend: Box<dyn SnapshotBackend>,
        credentials: &CredentialStore,
    ) -> Self {
        let snapshot: SessionSnapshot = snapshot::load_or_default(backend.as_ref(), STORE_LABEL);
        let state = match snapshot.signed_in {
            Some(username) if credentials.contains_user(&username) => {
                SessionState::SignedIn { username }
            }
            Some(_) => {
                warn!("event=session_restore module=session status=error error_code=unknown_user");
                SessionState::SignedOut
            }
            None => SessionState::SignedOut,
        };
        info!(
            "event=session_restore module=session status=ok signed_in={}",
            matches!(state, SessionState::SignedIn { .. })
        );
        Self {
            state,
            policy,
            backend: Some(backend),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self.state, SessionState::SignedIn { .. })
    }

    /// Signed-in username, or `NotSignedIn`.
    pub fn require_signed_in(&self) -> Result<&str, SessionError> {
        match &self.state {
            SessionState::SignedIn { username } => Ok(username.as_str()),
            SessionState::SignedOut => Err(SessionError::NotSignedIn),
        }
    }

    pub fn controls(&self) -> Controls {
        let signed_in = self.is_signed_in();
        Controls {
            edit: signed_in,
            sign_in: !signed_in,
            sign_up: !signed_in,
            sign_out: signed_in,
        }
    }

    /// Verifies credentials and enters `SignedIn`.
    ///
    /// # Side effects
    /// - Resets `tree` when the policy asks for it.
    ///
    /// # Errors
    /// - `AlreadySignedIn` when a user is already signed in.
    /// - `InvalidCredentials` when verification fails; state is unchanged.
    pub fn sign_in(
        &mut self,
        credentials: &CredentialStore,
        tree: &mut FamilyTreeStore,
        username: &str,
        password: &str,
    ) -> Result<(), SessionError> {
        if self.is_signed_in() {
            return Err(SessionError::AlreadySignedIn);
        }
        if !credentials.verify(username, password) {
            warn!("event=sign_in module=session status=error error_code=invalid_credentials");
            return Err(SessionError::InvalidCredentials);
        }

        self.state = SessionState::SignedIn {
            username: username.to_string(),
        };
        self.persist();
        if self.policy.reset_tree_on_sign_in {
            tree.reset();
        }
        info!(
            "event=sign_in module=session status=ok tree_reset={}",
            self.policy.reset_tree_on_sign_in
        );
        Ok(())
    }

    /// Leaves `SignedIn` and returns the username that was signed in.
    pub fn sign_out(&mut self) -> Result<String, SessionError> {
        match std::mem::replace(&mut self.state, SessionState::SignedOut) {
            SessionState::SignedIn { username } => {
                self.persist();
                info!("event=sign_out module=session status=ok");
                Ok(username)
            }
            SessionState::SignedOut => Err(SessionError::NotSignedIn),
        }
    }

    fn persist(&self) {
        let Some(backend) = &self.backend else {
            return;
        };
        let snapshot = SessionSnapshot {
            signed_in: match &self.state {
                SessionState::SignedIn { username } => Some(username.clone()),
                SessionState::SignedOut => None,
            },
        };
        if snapshot::save(backend.as_ref(), STORE_LABEL, &snapshot).is_err() {
            warn!("event=session_commit module=session status=degraded reason=persist_failed");
        }
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("policy", &self.policy)
            .field("persistent", &self.backend.is_some())
            .finish()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionPolicy::default())
    }
}
