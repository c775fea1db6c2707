//! Hierarchy store adapter: persists the materialized paths produced by
//! `treepath-encoding` in a byte-ordered key-value store (RocksDB) and
//! exposes the operations the tree needs: point lookup, pre-order prefix
//! scans and atomic bulk prefix rewrites for re-parenting.

mod access;
mod cache;
mod db;
mod errors;
mod hierarchy;
mod key;
mod ops;
mod registry;
mod writer;

pub mod prelude {
    pub use super::access::CachedDbAccess;
    pub use super::cache::Cache;
    pub use super::db::{create_temp_db, delete_db, ConnBuilder, TempDbLifetime, DB};
    pub use super::errors::{StoreError, StoreResult, StoreResultExtensions};
    pub use super::hierarchy::{DbHierarchyStore, HierarchyStore, HierarchyStoreReader, MemoryHierarchyStore};
    pub use super::key::DbKey;
    pub use super::ops::{ancestor_ids, children, create_node, move_subtree};
    pub use super::registry::StorePrefixes;
    pub use super::writer::{BatchDbWriter, DbWriter, DirectDbWriter};
}
