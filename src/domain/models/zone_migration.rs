//! Upgrading persisted zone state to the current schema.
//!
//! Version 1 was an untyped key/value blob: `prioHistory` (task id strings
//! mapped to `{prio, type?}`), `taskIdsToBlockageTimes` (task id strings
//! mapped to a cycle, `-1` meaning permanent), `bannedAnchors` and
//! `lastScoutPrioTick`. Version 2 is [`ZoneState`].

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::warn;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::priority::{ExpansionKind, PriorityRecord, PrioritySet};
use crate::domain::models::task::{TaskCatalog, TaskKind};
use crate::domain::models::world::{Position, ZoneId};
use crate::domain::models::zone::{BlockageEntry, ZoneState, ZONE_STATE_VERSION};

#[derive(Debug, Deserialize)]
struct LegacyPriority {
    prio: f64,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyPosition {
    x: u8,
    y: u8,
    #[serde(rename = "roomName")]
    room_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyZoneState {
    #[serde(default, rename = "prioHistory")]
    prio_history: Vec<HashMap<String, LegacyPriority>>,
    #[serde(default, rename = "taskIdsToBlockageTimes")]
    blockage_times: HashMap<String, i64>,
    #[serde(default, rename = "bannedAnchors")]
    banned_anchors: Vec<LegacyPosition>,
    #[serde(default, rename = "lastScoutPrioTick")]
    last_scout_prio_tick: Option<u64>,
}

/// Decode persisted zone state of any known version.
pub fn migrate_zone_state(
    zone: &ZoneId,
    raw: serde_json::Value,
    catalog: &TaskCatalog,
) -> DomainResult<ZoneState> {
    let version = raw
        .get("version")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(1);

    match version {
        1 => {
            let legacy: LegacyZoneState = serde_json::from_value(raw)?;
            Ok(upgrade_v1(zone, legacy, catalog))
        }
        v if v == u64::from(ZONE_STATE_VERSION) => Ok(serde_json::from_value(raw)?),
        other => Err(DomainError::MigrationFailed(format!(
            "zone {zone}: unsupported state version {other}"
        ))),
    }
}

fn resolve_task(zone: &ZoneId, key: &str, catalog: &TaskCatalog) -> Option<TaskKind> {
    let resolved = key
        .parse::<u16>()
        .ok()
        .and_then(|id| catalog.get_by_id(id).ok())
        .map(|entry| entry.kind);
    if resolved.is_none() {
        warn!(zone = %zone, task_id = key, "dropping unknown task id from legacy zone state");
    }
    resolved
}

fn parse_kind(raw: Option<&str>) -> ExpansionKind {
    match raw {
        Some("harassment") => ExpansionKind::Harassment,
        Some("obliteration") => ExpansionKind::Obliteration,
        _ => ExpansionKind::Settling,
    }
}

fn upgrade_v1(zone: &ZoneId, legacy: LegacyZoneState, catalog: &TaskCatalog) -> ZoneState {
    let mut state = ZoneState::new(zone.clone());

    let history: VecDeque<PrioritySet> = legacy
        .prio_history
        .into_iter()
        .map(|entry| {
            entry
                .into_iter()
                .filter_map(|(key, prio)| {
                    let task = resolve_task(zone, &key, catalog)?;
                    if !task.is_unit_assignable() {
                        return None;
                    }
                    Some(if task == TaskKind::InfluenceExpansion {
                        PriorityRecord::expansion(parse_kind(prio.kind.as_deref()), prio.prio)
                    } else {
                        PriorityRecord::new(task, prio.prio)
                    })
                })
                .collect()
        })
        .collect();
    state.priority_history = history;

    let mut ledger = BTreeMap::new();
    for (key, cycle) in legacy.blockage_times {
        let Some(task) = resolve_task(zone, &key, catalog) else {
            continue;
        };
        let entry = if cycle < 0 {
            BlockageEntry {
                cycle: 0,
                permanent: true,
            }
        } else {
            BlockageEntry {
                cycle: cycle as u64,
                permanent: false,
            }
        };
        ledger.insert(task, entry);
    }
    state.blockage_ledger = ledger;

    state.banned_anchors = legacy
        .banned_anchors
        .into_iter()
        .map(|p| Position::new(p.room_name, p.x, p.y))
        .collect();
    state.last_scout_request = legacy.last_scout_prio_tick;
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upgrade_v1_blob() {
        let catalog = TaskCatalog::standard().unwrap();
        let raw = json!({
            "prioHistory": [
                {"0": {"prio": 80.0}, "5": {"type": "harassment", "prio": 40.0}},
                {"0": {"prio": 60.0}, "5": {"type": "obliteration", "prio": 45.0}}
            ],
            "taskIdsToBlockageTimes": {"3": 1200, "7": -1, "404": 5},
            "bannedAnchors": [{"x": 10, "y": 12, "roomName": "W1N1"}],
            "lastScoutPrioTick": 900
        });

        let state = migrate_zone_state(&ZoneId::new("W1N1"), raw, &catalog).unwrap();

        assert_eq!(state.version, ZONE_STATE_VERSION);
        assert_eq!(state.priority_history.len(), 2);
        assert_eq!(
            state.priority_history[1].expansion_kind(),
            Some(ExpansionKind::Obliteration)
        );
        assert_eq!(
            state.blockage_ledger.get(&TaskKind::TowerConstruction),
            Some(&BlockageEntry {
                cycle: 1200,
                permanent: false
            })
        );
        assert!(state.blockage_ledger[&TaskKind::WallConstruction].permanent);
        assert_eq!(state.blockage_ledger.len(), 2);
        assert_eq!(state.banned_anchors.len(), 1);
        assert_eq!(state.last_scout_request, Some(900));
    }

    #[test]
    fn test_current_version_passes_through() {
        let catalog = TaskCatalog::standard().unwrap();
        let state = ZoneState::new(ZoneId::new("W2N2"));
        let raw = serde_json::to_value(&state).unwrap();

        let back = migrate_zone_state(&state.zone, raw, &catalog).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_future_version_rejected() {
        let catalog = TaskCatalog::standard().unwrap();
        let raw = json!({"version": 99, "zone": "W1N1"});
        let result = migrate_zone_state(&ZoneId::new("W1N1"), raw, &catalog);
        assert!(matches!(result, Err(DomainError::MigrationFailed(_))));
    }
}
