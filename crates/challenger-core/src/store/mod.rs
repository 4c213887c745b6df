//! Persisted key-value storage.
//!
//! Every piece of client state (current session marker, session registry,
//! cached snapshots) lives in a flat string-to-string store, the same shape
//! as browser local storage. Components take an `Arc<dyn KeyValueStore>` so
//! tests can use `MemoryStore` while the CLI binds `FileStore`.

pub mod error;
pub mod file;
pub mod memory;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;

/// Flat string key-value storage.
///
/// Implementations use interior mutability so a single store can be shared
/// by the marker, the registry and the snapshot cache.
pub trait KeyValueStore: Send + Sync {
    /// Read the value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
