//! Save/restore availability for a session, as shown to the user.
//!
//! A save is offered only when the live snapshot differs from the cached one;
//! otherwise it is reported as already saved. Restore is available whenever
//! a snapshot is cached, live state or not.

use serde::Serialize;

use crate::cache::SnapshotCache;
use crate::models::{ChallengeSummary, DataSnapshot, ProgressSnapshot, Snapshot, SnapshotKind};
use crate::session::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum SaveAction {
    /// Live state differs from the cache (or nothing is cached)
    Offered,
    /// Live state matches the cache
    AlreadySaved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ActionState {
    /// `None` when no live state was available to compare
    pub save: Option<SaveAction>,
    pub restore_available: bool,
}

impl ActionState {
    fn new<S: Snapshot>(cache: &SnapshotCache, id: &SessionId, live: Option<&S>) -> Self {
        let save = live.map(|live| {
            if cache.is_dirty(id, live) {
                SaveAction::Offered
            } else {
                SaveAction::AlreadySaved
            }
        });
        Self {
            save,
            restore_available: cache.has(id, S::KIND),
        }
    }

    pub fn can_save(&self) -> bool {
        self.save == Some(SaveAction::Offered)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SessionStatus {
    pub session: String,
    pub summary: Option<ChallengeSummary>,
    pub todo_count: Option<usize>,
    pub progress: ActionState,
    pub data: ActionState,
}

impl SessionStatus {
    pub fn action(&self, kind: SnapshotKind) -> &ActionState {
        match kind {
            SnapshotKind::Progress => &self.progress,
            SnapshotKind::Data => &self.data,
        }
    }
}

pub fn session_status(
    cache: &SnapshotCache,
    id: &SessionId,
    live_progress: Option<&ProgressSnapshot>,
    live_data: Option<&DataSnapshot>,
) -> SessionStatus {
    SessionStatus {
        session: id.to_string(),
        summary: live_progress.map(ProgressSnapshot::summary),
        todo_count: live_data.map(|data| data.todos.len()),
        progress: ActionState::new(cache, id, live_progress),
        data: ActionState::new(cache, id, live_data),
    }
}
