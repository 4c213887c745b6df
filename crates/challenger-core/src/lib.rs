//! challenger-core - local save and restore of API challenge sessions.
//!
//! Keeps a registry of the sessions a client has used, caches each session's
//! progress and todo database, reports whether the live state has changed
//! since the last save, and pushes a cached copy back to the server on
//! request.

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod session;
pub mod status;
pub mod store;
pub mod tracker;

pub use api::{ApiClient, ApiError, LiveState, OverwriteTransport, RestoreClient, RestoreOutcome};
pub use cache::{CachedBlob, SnapshotCache};
pub use config::Config;
pub use models::{ChallengeSummary, DataSnapshot, ProgressSnapshot, Snapshot, SnapshotKind, TodoItem};
pub use session::{SessionId, SessionMarker, SessionRegistry};
pub use status::{ActionState, SaveAction, SessionStatus};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use tracker::ChallengeTracker;
