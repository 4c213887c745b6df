use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Snapshot, SnapshotKind};

/// Challenger object as served by `GET /challenger/{id}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    #[serde(rename = "xChallenger", default, skip_serializing_if = "Option::is_none")]
    pub x_challenger: Option<String>,
    #[serde(rename = "challengeStatus", default)]
    pub challenge_status: BTreeMap<String, bool>,
    /// Fields not modelled here (auth token, secret note, ...), kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Snapshot for ProgressSnapshot {
    const KIND: SnapshotKind = SnapshotKind::Progress;
}

impl ProgressSnapshot {
    pub fn summary(&self) -> ChallengeSummary {
        let total = self.challenge_status.len();
        let complete = self.challenge_status.values().filter(|&&done| done).count();
        ChallengeSummary {
            total,
            complete,
            remaining: total - complete,
        }
    }
}

/// Challenge completion counts for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ChallengeSummary {
    pub total: usize,
    pub complete: usize,
    pub remaining: usize,
}
