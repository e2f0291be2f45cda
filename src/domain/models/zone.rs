//! Durable per-zone state.
//!
//! Owned by the engine and persisted between cycles through a
//! [`ZoneStore`](crate::domain::ports::ZoneStore). Behavior executors never
//! touch it directly; their feedback arrives as signals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::domain::models::priority::PrioritySet;
use crate::domain::models::task::TaskKind;
use crate::domain::models::world::{Position, ZoneId};

/// Current schema version of [`ZoneState`].
pub const ZONE_STATE_VERSION: u32 = 2;

/// Suppression record for one objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockageEntry {
    /// Cycle the block was recorded at.
    pub cycle: u64,
    /// Survives expiry; only a full reset clears it.
    #[serde(default)]
    pub permanent: bool,
}

/// Which pinned slots were filled during the last decision pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedRoles {
    pub transporter_bound: bool,
    pub upgrader_bound: bool,
    pub link_operator_bound: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneState {
    #[serde(default = "current_version")]
    pub version: u32,
    pub zone: ZoneId,
    /// Most recent unit-assignable score sets, oldest first.
    #[serde(default)]
    pub priority_history: VecDeque<PrioritySet>,
    #[serde(default)]
    pub blockage_ledger: BTreeMap<TaskKind, BlockageEntry>,
    #[serde(default)]
    pub pinned_roles: PinnedRoles,
    #[serde(default)]
    pub banned_anchors: BTreeSet<Position>,
    /// Unsafe-path reports per objective since the last counter reset.
    #[serde(default)]
    pub unsafe_reports: BTreeMap<TaskKind, u32>,
    #[serde(default)]
    pub last_scout_request: Option<u64>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

const fn current_version() -> u32 {
    ZONE_STATE_VERSION
}

impl ZoneState {
    /// Fresh state for a zone seen for the first time.
    pub fn new(zone: ZoneId) -> Self {
        Self {
            version: ZONE_STATE_VERSION,
            zone,
            priority_history: VecDeque::new(),
            blockage_ledger: BTreeMap::new(),
            pinned_roles: PinnedRoles::default(),
            banned_anchors: BTreeSet::new(),
            unsafe_reports: BTreeMap::new(),
            last_scout_request: None,
            updated_at: Utc::now(),
        }
    }

    pub fn latest_priorities(&self) -> Option<&PrioritySet> {
        self.priority_history.back()
    }

    pub fn history_len(&self) -> usize {
        self.priority_history.len()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_zone_state_is_empty() {
        let state = ZoneState::new(ZoneId::new("W1N1"));
        assert_eq!(state.version, ZONE_STATE_VERSION);
        assert!(state.priority_history.is_empty());
        assert!(state.blockage_ledger.is_empty());
        assert_eq!(state.pinned_roles, PinnedRoles::default());
    }

    #[test]
    fn test_zone_state_json_roundtrip_keeps_ledger_keys() {
        let mut state = ZoneState::new(ZoneId::new("W1N1"));
        state.blockage_ledger.insert(
            TaskKind::WallConstruction,
            BlockageEntry {
                cycle: 12,
                permanent: true,
            },
        );

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"wall_construction\""));

        let back: ZoneState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.blockage_ledger, state.blockage_ledger);
    }
}
