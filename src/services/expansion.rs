//! Scoring of the expansion objective.
//!
//! Besides a score, the expansion scorer classifies what kind of expansion
//! the target calls for: settling an unowned or friendly zone, harassing a
//! walled-in hostile, or obliterating a reachable one.

use tracing::warn;

use crate::domain::models::{
    EngineConfig, ExpansionKind, ExpansionTarget, Position, PriorityRecord, TargetZoneView,
    TaskKind, ZoneState, ZoneView,
};
use crate::domain::ports::PathCost;

#[derive(Debug, Clone)]
pub struct ExpansionScorer {
    config: EngineConfig,
}

impl Default for ExpansionScorer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ExpansionScorer {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Score the zone's expansion target for this cycle.
    ///
    /// With no target the objective is settling at 0. When the target zone
    /// is not observed this cycle the latest recorded expansion record is
    /// carried forward.
    pub fn score(
        &self,
        home: &ZoneView,
        target: Option<&ExpansionTarget>,
        state: &ZoneState,
        pathing: &dyn PathCost,
    ) -> PriorityRecord {
        let Some(target) = target else {
            return idle_record();
        };
        match &target.observed {
            Some(observed) => self.score_observed(home, target, observed, pathing),
            None => {
                warn!(
                    zone = %home.zone,
                    target = %target.flag.zone,
                    "expansion target not observed this cycle; reusing last record"
                );
                state
                    .latest_priorities()
                    .and_then(|set| set.get(TaskKind::InfluenceExpansion))
                    .copied()
                    .unwrap_or_else(idle_record)
            }
        }
    }

    fn score_observed(
        &self,
        home: &ZoneView,
        target: &ExpansionTarget,
        observed: &TargetZoneView,
        pathing: &dyn PathCost,
    ) -> PriorityRecord {
        if observed.safe_mode {
            return idle_record();
        }
        if !pathing
            .path_cost(&home_anchor(home), std::slice::from_ref(&target.flag), 1, true)
            .reachable
        {
            warn!(zone = %home.zone, target = %target.flag, "expansion target unreachable");
            return idle_record();
        }

        let friendly = match &observed.owner {
            None => true,
            Some(owner) => *owner == home.owner,
        };
        if friendly || observed.hostile_spawns.is_empty() {
            let resources = self.resource_measure(observed);
            return PriorityRecord::expansion(ExpansionKind::Settling, resources * 100.0);
        }

        let score = (1.0 - defense_measure(observed)) * 100.0;
        let kind = if walled_in(target, observed, pathing) {
            ExpansionKind::Harassment
        } else {
            ExpansionKind::Obliteration
        };
        PriorityRecord::expansion(kind, score)
    }

    /// Resource richness in `[0, 1]`.
    ///
    /// A desired mineral makes a zone maximally attractive. Otherwise energy
    /// sources and mineral density are weighted evenly; anything above 0.5
    /// is flattened to 0.85.
    pub fn resource_measure(&self, observed: &TargetZoneView) -> f64 {
        let desired = observed
            .minerals
            .iter()
            .any(|m| self.config.desired_minerals.contains(&m.mineral));
        if desired {
            return 1.0;
        }
        let density: f64 = observed.minerals.iter().map(|m| m.density.rating()).sum();
        let measure = ((f64::from(observed.source_count) / 2.0 + density + 0.2) / 2.0).min(1.0);
        if measure > 0.5 {
            0.85
        } else {
            measure
        }
    }
}

/// Where routes out of the home zone start: the spawn, else the controller,
/// else the zone center.
fn home_anchor(home: &ZoneView) -> Position {
    home.spawn
        .as_ref()
        .map(|spawn| spawn.pos.clone())
        .or_else(|| home.controller_pos.clone())
        .unwrap_or_else(|| Position::new(home.zone.as_str(), 25, 25))
}

fn idle_record() -> PriorityRecord {
    PriorityRecord::expansion(ExpansionKind::Settling, 0.0)
}

/// Strength of the target's defenses in `[0, 1]`.
pub fn defense_measure(observed: &TargetZoneView) -> f64 {
    let towers: f64 = observed
        .hostile_towers
        .iter()
        .map(|t| t.fill_ratio())
        .sum::<f64>()
        / 3.0;
    let largest = observed
        .hostiles
        .iter()
        .map(|h| h.body_size)
        .max()
        .unwrap_or(0);
    (towers * f64::from(largest) / 50.0).min(1.0)
}

fn walled_in(target: &ExpansionTarget, observed: &TargetZoneView, pathing: &dyn PathCost) -> bool {
    let Some(spawn) = observed.hostile_spawns.first() else {
        return false;
    };
    !pathing
        .path_cost(&target.flag, std::slice::from_ref(spawn), 1, true)
        .reachable
}
