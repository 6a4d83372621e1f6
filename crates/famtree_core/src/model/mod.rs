//! Family tree domain model.
//!
//! # Responsibility
//! - Define person identity, the persisted record shape and the in-memory
//!   arena that owns every node.
//!
//! # Invariants
//! - Every node is identified by a stable `PersonId`; names are mutable labels.
//! - Each node is owned by exactly one container (root list or child list).

pub mod forest;
pub mod person;
