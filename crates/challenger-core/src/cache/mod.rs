//! Local snapshot cache for restoring sessions.
//!
//! This module provides the `SnapshotCache` for storing the last saved
//! progress and data snapshots of each session, and the dirty check that
//! decides whether saving the live state again would change anything.
//!
//! Blobs are keyed `<id>.progress` and `<id>.data` and hold canonical JSON.
//! They change only on an explicit save and disappear when the session is
//! forgotten.

pub mod dirty;
pub mod manager;

pub use manager::{cache_key, CachedBlob, SnapshotCache};
