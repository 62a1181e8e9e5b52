//! Prelude module with the collection and cell types used across the crate.
//!
//! Keeps one import path for the shared-ownership primitives and the hashed
//! collections, so the hasher choice lives in a single place.

// ═══════════════════════════════════════════════════════════════════════════════
// Core types
// ═══════════════════════════════════════════════════════════════════════════════

pub use std::{
    cell::{Cell, RefCell},
    fmt,
    hash::Hash,
    rc::{Rc, Weak},
};

// ═══════════════════════════════════════════════════════════════════════════════
// Hashed collections
// ═══════════════════════════════════════════════════════════════════════════════

pub use rustc_hash::FxHashMap;

// IndexMap/IndexSet - insertion-ordered, FxHasher-backed
pub type IndexMap<K, V> =
    indexmap::IndexMap<K, V, core::hash::BuildHasherDefault<rustc_hash::FxHasher>>;

pub type IndexSet<T> =
    indexmap::IndexSet<T, core::hash::BuildHasherDefault<rustc_hash::FxHasher>>;

/// Create an empty IndexMap
#[inline]
pub fn index_map_new<K, V>() -> IndexMap<K, V>
where
    K: Hash + Eq,
{
    indexmap::IndexMap::with_hasher(Default::default())
}

/// Create an empty IndexSet
#[inline]
pub fn index_set_new<T>() -> IndexSet<T>
where
    T: Hash + Eq,
{
    indexmap::IndexSet::with_hasher(Default::default())
}
