//! Command execution for the `famtree` binary.
//!
//! # Responsibility
//! - Map parsed subcommands onto store/session entry points.
//! - Render results as plain text lines.
//!
//! # Invariants
//! - Every user-facing failure becomes a `CliError`; nothing panics.
//! - Tree mutations (`add`, `delete`, `edit`, `reset`) require a signed-in
//!   session; `sign-up` and `sign-in` require a signed-out one.

use clap::Subcommand;
use famtree_core::{
    CredentialStore, DeleteOutcome, FamilyTreeStore, Session, SessionError, TreeError,
    ValidationError,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a person, optionally under an existing parent.
    Add {
        name: String,
        /// Parent name; unknown or empty parents create a new root.
        #[arg(long, default_value = "")]
        parent: String,
    },
    /// Delete a root person and same-named children of other roots.
    Delete {
        name: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Rename a root person.
    Edit { old_name: String, new_name: String },
    /// Remove everyone from the tree.
    Reset,
    /// Look up a person by name.
    Find { name: String },
    /// Print the tree as an indented outline.
    Show,
    /// Register or overwrite a user.
    SignUp { username: String, password: String },
    /// Verify credentials and sign in.
    SignIn { username: String, password: String },
    /// End the current session.
    SignOut,
}

impl Command {
    fn mutates_tree(&self) -> bool {
        matches!(
            self,
            Self::Add { .. } | Self::Delete { .. } | Self::Edit { .. } | Self::Reset
        )
    }
}

/// User-facing command failure.
#[derive(Debug)]
pub enum CliError {
    Tree(TreeError),
    Session(SessionError),
    Validation(ValidationError),
    NotFound(String),
    Output(std::io::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tree(err) => write!(f, "{err}"),
            Self::Session(SessionError::InvalidCredentials) => write!(f, "Invalid credentials."),
            Self::Session(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(name) => write!(f, "person not found: {name}"),
            Self::Output(err) => write!(f, "failed to write output: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tree(err) => Some(err),
            Self::Session(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Output(err) => Some(err),
        }
    }
}

impl From<TreeError> for CliError {
    fn from(value: TreeError) -> Self {
        Self::Tree(value)
    }
}

impl From<SessionError> for CliError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

impl From<ValidationError> for CliError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Output(value)
    }
}

/// Stores and session loaded for one invocation.
pub struct App {
    pub tree: FamilyTreeStore,
    pub credentials: CredentialStore,
    pub session: Session,
}

impl App {
    /// Runs one command, writing results to `out`.
    ///
    /// `confirm` is consulted only by `delete` without `--yes`.
    ///
    /// # Errors
    /// - `CliError::Session(NotSignedIn)` for tree mutations while signed out.
    /// - `CliError::Session(AlreadySignedIn)` for `sign-up` while signed in.
    pub fn execute(
        &mut self,
        command: Command,
        out: &mut impl Write,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<(), CliError> {
        if command.mutates_tree() {
            self.session.require_signed_in()?;
        }
        match command {
            Command::Add { name, parent } => {
                let id = self.tree.add_person(&name, &parent)?;
                let person = self.tree.forest().get(id).map(|p| p.name()).unwrap_or("");
                writeln!(out, "Added {person}.")?;
            }
            Command::Delete { name, yes } => {
                let outcome = if yes {
                    self.tree.delete_person(&name, |_| true)?
                } else {
                    self.tree.delete_person(&name, confirm)?
                };
                match outcome {
                    DeleteOutcome::Deleted { .. } => writeln!(out, "Deleted {}.", name.trim())?,
                    DeleteOutcome::Cancelled => writeln!(out, "Delete cancelled.")?,
                }
            }
            Command::Edit { old_name, new_name } => {
                self.tree.edit_person(&old_name, &new_name)?;
                writeln!(out, "Renamed {} to {}.", old_name.trim(), new_name.trim())?;
            }
            Command::Reset => {
                self.tree.reset();
                writeln!(out, "Family tree cleared.")?;
            }
            Command::Find { name } => {
                let person = self
                    .tree
                    .find_by_name(&name)
                    .ok_or_else(|| CliError::NotFound(name.trim().to_string()))?;
                writeln!(out, "{}", person.name())?;
                for child in person.children() {
                    writeln!(out, "  {}", child.name())?;
                }
            }
            Command::Show => {
                if self.tree.forest().is_empty() {
                    writeln!(out, "(empty)")?;
                }
                for (depth, person) in self.tree.forest().walk() {
                    writeln!(out, "{}{}", "  ".repeat(depth), person.name())?;
                }
            }
            Command::SignUp { username, password } => {
                if !self.session.controls().sign_up {
                    return Err(SessionError::AlreadySignedIn.into());
                }
                self.credentials.register(&username, &password)?;
                writeln!(out, "Sign up successful! You can now sign in.")?;
            }
            Command::SignIn { username, password } => {
                self.session
                    .sign_in(&self.credentials, &mut self.tree, &username, &password)?;
                writeln!(out, "Welcome, {username}!")?;
            }
            Command::SignOut => {
                let username = self.session.sign_out()?;
                writeln!(out, "Goodbye, {username}.")?;
            }
        }
        Ok(())
    }
}
