//! Store Module
//!
//! The key/value table shared by every connection.
//!
//! ## Responsibilities
//! - Atomic single-key reads and writes
//! - Safe concurrent access from many connection threads
//!
//! No multi-key transactions, compare-and-swap or expiration. `set` always
//! overwrites, and between two racing writers the one that takes the lock
//! last wins.
//!
//! ## Data Structure Choice
//! `MemoryStore` stripes keys across cache-padded shards, each a
//! `HashMap` behind its own `RwLock`, so writers to different keys rarely
//! contend.

mod memory;

pub use memory::MemoryStore;

use bytes::Bytes;

/// Byte-string key/value storage used by the dispatcher
pub trait Store: Send + Sync {
    /// Look up a value by key
    fn get(&self, key: &[u8]) -> Option<Bytes>;

    /// Assign `value` to `key`, replacing any previous value
    fn set(&self, key: Bytes, value: Bytes);
}
