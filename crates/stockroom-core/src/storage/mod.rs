//! # Persistent Storage
//!
//! Disk-backed implementations of `InventoryStore`.

mod redb_store;

pub use redb_store::RedbStore;
