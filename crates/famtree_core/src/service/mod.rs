//! Core use-case services.
//!
//! # Responsibility
//! - Own the family tree and credential stores behind command-level APIs.
//! - Model the sign-in session that gates editing.
//! - Keep presentation layers decoupled from snapshot storage details.

pub mod credentials;
pub mod family_tree;
pub mod session;
