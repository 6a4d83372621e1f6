//! Snapshot persistence for whole-structure stores.
//!
//! # Responsibility
//! - Define the durable medium contract stores dump to and reload from.
//! - Keep file and SQL details out of store/business logic.
//!
//! # Invariants
//! - A write replaces the whole stored document or leaves the previous one
//!   intact; partial documents are never observable.
//! - Missing, unreadable or mistyped documents load as an empty store.

pub mod json_file;
pub mod snapshot;
pub mod sqlite;
