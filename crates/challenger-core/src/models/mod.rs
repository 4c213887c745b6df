//! Snapshot models for challenger session state.
//!
//! - `ProgressSnapshot`: the challenger object with per-challenge completion
//! - `DataSnapshot`: the todo database for a session
//! - `Snapshot`: common trait giving each model its cache kind and
//!   canonical serialization
//!
//! Both models keep fields they do not name so a cached copy restores the
//! server object in full.

pub mod canonical;
pub mod database;
pub mod progress;

use serde::{de::DeserializeOwned, Serialize};

pub use canonical::to_canonical_string;
pub use database::{DataSnapshot, TodoItem};
pub use progress::{ChallengeSummary, ProgressSnapshot};

/// Which of the two per-session snapshots a blob holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    Progress,
    Data,
}

impl SnapshotKind {
    pub const ALL: [SnapshotKind; 2] = [SnapshotKind::Progress, SnapshotKind::Data];

    /// Suffix of the storage key, `<id>.<suffix>`
    pub fn key_suffix(self) -> &'static str {
        match self {
            SnapshotKind::Progress => "progress",
            SnapshotKind::Data => "data",
        }
    }
}

impl std::fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key_suffix())
    }
}

/// A cacheable snapshot of server-owned session state.
pub trait Snapshot: Serialize + DeserializeOwned {
    const KIND: SnapshotKind;

    /// Byte-stable serialization used for both storage and dirty checks.
    fn canonical_json(&self) -> serde_json::Result<String> {
        to_canonical_string(self)
    }
}
