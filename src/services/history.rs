//! Rolling priority history and the production priorities derived from it.

use tracing::warn;

use crate::domain::models::{
    ExpansionKind, PrioritySet, ProductionPriorities, SquadSpecification, TaskKind, UnitCensus,
    ZoneState,
};

/// Keeps the most recent priority snapshots of a zone and smooths them into
/// production priorities.
#[derive(Debug, Clone, Copy)]
pub struct HistoryAggregator {
    depth: usize,
}

impl Default for HistoryAggregator {
    fn default() -> Self {
        Self::new(3)
    }
}

impl HistoryAggregator {
    pub fn new(depth: usize) -> Self {
        Self {
            depth: depth.max(1),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Append a snapshot, evicting the oldest ones beyond the window.
    pub fn record(&self, state: &mut ZoneState, set: PrioritySet) {
        state.priority_history.push_back(set);
        while state.priority_history.len() > self.depth {
            state.priority_history.pop_front();
        }
    }

    /// Production priorities for this cycle.
    ///
    /// The defense objective is always present with `defense_score`. Every
    /// other entry needs a full history window; without one only the
    /// defense objective is returned.
    pub fn averaged_production(
        &self,
        state: &ZoneState,
        census: &UnitCensus,
        defense_score: f64,
    ) -> ProductionPriorities {
        let mut production = ProductionPriorities::new();
        production.set(TaskKind::BruiserDefenseSpawning, defense_score);

        let history = &state.priority_history;
        if history.len() < self.depth {
            warn!(
                zone = %state.zone,
                depth = history.len(),
                required = self.depth,
                "priority history too short; only defense production was scored"
            );
            return production;
        }

        let Some(oldest) = history.front() else {
            return production;
        };
        let window = history.len() as f64;

        for task in oldest.tasks() {
            let average = history
                .iter()
                .map(|set| set.score(task).unwrap_or(0.0))
                .sum::<f64>()
                / window;

            let spawning = if task == TaskKind::InfluenceExpansion {
                self.expansion_production(state, census)
            } else {
                role_production(state, task)
            };

            if let Some(spawning) = spawning {
                production.raise(spawning, average);
            }
        }

        production
    }

    /// Production objective fed by the averaged expansion score.
    fn expansion_production(&self, state: &ZoneState, census: &UnitCensus) -> Option<TaskKind> {
        let kind = dominant_expansion_kind(state)?;
        match SquadSpecification::for_expansion(kind) {
            None => Some(TaskKind::ClaimerSpawning),
            Some(squad) => squad
                .first_shortfall(census)
                .and_then(|unit_type| unit_type.production_tasks().first().copied()),
        }
    }
}

fn role_production(state: &ZoneState, task: TaskKind) -> Option<TaskKind> {
    let role = task.role()?;
    let unit_types = role.unit_types();
    if unit_types.len() != 1 {
        warn!(
            zone = %state.zone,
            task = %task,
            role = role.as_str(),
            "ambiguous unit type for objective; using the first"
        );
    }
    unit_types
        .first()
        .and_then(|unit_type| unit_type.production_tasks().first().copied())
}

/// Most frequent expansion kind across the window; ties go to the most
/// recent snapshot.
pub fn dominant_expansion_kind(state: &ZoneState) -> Option<ExpansionKind> {
    let kinds: Vec<ExpansionKind> = state
        .priority_history
        .iter()
        .filter_map(PrioritySet::expansion_kind)
        .collect();

    let mut best: Option<(ExpansionKind, usize)> = None;
    for &kind in kinds.iter().rev() {
        let count = kinds.iter().filter(|&&k| k == kind).count();
        match best {
            Some((_, top)) if count <= top => {}
            _ => best = Some((kind, count)),
        }
    }
    best.map(|(kind, _)| kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{PriorityRecord, Unit, UnitType, ZoneId};

    fn snapshot(worker_score: f64, expansion: (ExpansionKind, f64)) -> PrioritySet {
        [
            PriorityRecord::new(TaskKind::EnergyHarvesting, worker_score),
            PriorityRecord::new(TaskKind::Scouting, 0.0),
            PriorityRecord::expansion(expansion.0, expansion.1),
        ]
        .into_iter()
        .collect()
    }

    fn state() -> ZoneState {
        ZoneState::new(ZoneId::new("W1N1"))
    }

    #[test]
    fn test_record_keeps_window() {
        let aggregator = HistoryAggregator::new(3);
        let mut state = state();
        for i in 0..5 {
            aggregator.record(
                &mut state,
                snapshot(f64::from(i), (ExpansionKind::Settling, 0.0)),
            );
        }
        assert_eq!(state.priority_history.len(), 3);
        assert_eq!(
            state.priority_history[0].score(TaskKind::EnergyHarvesting),
            Some(2.0)
        );
        assert_eq!(
            state.priority_history[2].score(TaskKind::EnergyHarvesting),
            Some(4.0)
        );
    }

    #[test]
    fn test_short_history_yields_defense_only() {
        let aggregator = HistoryAggregator::new(3);
        let mut state = state();
        aggregator.record(&mut state, snapshot(80.0, (ExpansionKind::Settling, 10.0)));

        let production = aggregator.averaged_production(&state, &UnitCensus::default(), 75.0);
        assert_eq!(production.len(), 1);
        assert_eq!(production.get(TaskKind::BruiserDefenseSpawning), Some(75.0));
    }

    #[test]
    fn test_full_history_averages_into_production() {
        let aggregator = HistoryAggregator::new(3);
        let mut state = state();
        aggregator.record(&mut state, snapshot(30.0, (ExpansionKind::Settling, 10.0)));
        aggregator.record(&mut state, snapshot(60.0, (ExpansionKind::Settling, 20.0)));
        aggregator.record(&mut state, snapshot(90.0, (ExpansionKind::Settling, 30.0)));

        let production = aggregator.averaged_production(&state, &UnitCensus::default(), 0.0);
        assert_eq!(production.get(TaskKind::WorkerSpawning), Some(60.0));
        assert_eq!(production.get(TaskKind::ScoutSpawning), Some(0.0));
        assert_eq!(production.get(TaskKind::ClaimerSpawning), Some(20.0));
        assert_eq!(production.get(TaskKind::BruiserDefenseSpawning), Some(0.0));
    }

    #[test]
    fn test_aggressive_expansion_feeds_first_squad_shortfall() {
        let aggregator = HistoryAggregator::new(3);
        let mut state = state();
        aggregator.record(&mut state, snapshot(0.0, (ExpansionKind::Obliteration, 60.0)));
        aggregator.record(&mut state, snapshot(0.0, (ExpansionKind::Obliteration, 60.0)));
        aggregator.record(&mut state, snapshot(0.0, (ExpansionKind::Harassment, 60.0)));

        let medics: Vec<Unit> = (0..4)
            .map(|i| Unit::new(format!("m{i}"), UnitType::Medic))
            .collect();
        let census = UnitCensus::from_units(&medics);

        let production = aggregator.averaged_production(&state, &census, 0.0);
        assert_eq!(production.get(TaskKind::TankSpawning), Some(60.0));
        assert_eq!(production.get(TaskKind::ClaimerSpawning), None);
    }

    #[test]
    fn test_dominant_kind_tie_prefers_most_recent() {
        let aggregator = HistoryAggregator::new(2);
        let mut state = state();
        aggregator.record(&mut state, snapshot(0.0, (ExpansionKind::Harassment, 1.0)));
        aggregator.record(&mut state, snapshot(0.0, (ExpansionKind::Obliteration, 1.0)));
        assert_eq!(
            dominant_expansion_kind(&state),
            Some(ExpansionKind::Obliteration)
        );
    }
}
