//! Key-value persistence for Beacon.
//!
//! The engine keeps three small records (visitor id, session, offline queue)
//! and treats every write as best effort. Backends report failures through
//! `StorageResult` so callers decide whether to ignore them.
//!
//! # Backends
//!
//! - `MemoryStore`: process-local map with an optional byte quota
//! - `FileStore`: one file per key in a directory, written via temp-file rename

mod error;
mod file;
mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;

/// A string key-value store with fallible reads and writes.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}
