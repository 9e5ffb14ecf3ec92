//! In-memory store implementation
//!
//! Lock-striped HashMap shards with one RwLock each.

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::BuildHasher;

use bytes::Bytes;
use crossbeam::utils::CachePadded;
use parking_lot::RwLock;

use super::Store;

/// Process-wide in-memory key/value table
pub struct MemoryStore {
    /// Shards, always a power of two in number
    shards: Box<[CachePadded<RwLock<HashMap<Bytes, Bytes>>>]>,

    /// Picks the shard for a key
    hasher: RandomState,
}

impl MemoryStore {
    const DEFAULT_SHARDS: usize = 16;

    /// Create a new empty store
    pub fn new() -> Self {
        Self::with_shards(Self::DEFAULT_SHARDS)
    }

    /// Create a store with at least `count` shards (rounded up to a power of two)
    pub fn with_shards(count: usize) -> Self {
        let count = count.max(1).next_power_of_two();
        let shards = (0..count)
            .map(|_| CachePadded::new(RwLock::new(HashMap::new())))
            .collect();

        Self {
            shards,
            hasher: RandomState::new(),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Number of keys across all shards
    ///
    /// Shards are read one at a time, so the total is approximate while
    /// writers are active.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }

    fn shard(&self, key: &[u8]) -> &RwLock<HashMap<Bytes, Bytes>> {
        let hash = self.hasher.hash_one(key) as usize;
        &self.shards[hash & (self.shards.len() - 1)]
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.shard(key).read().get(key).cloned()
    }

    fn set(&self, key: Bytes, value: Bytes) {
        self.shard(&key).write().insert(key, value);
    }
}
