//! The per-zone decision pass.
//!
//! Order within a pass:
//! 1. score the expansion objective and direct scouts towards unseen targets
//! 2. score every unit-assignable objective
//! 3. derive production priorities from the history recorded so far
//! 4. assign units
//! 5. request production
//! 6. zero blocked objectives and record the post-assignment set

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::models::{
    EngineConfig, ExpansionTarget, PrioritySet, ProductionPriorities, TaskBinding, TaskCatalog,
    TaskKind, Unit, UnitCensus, UnitType, ZoneId, ZoneState,
};
use crate::domain::ports::World;
use crate::services::assignment::{
    AssignmentContext, AssignmentEngine, AssignmentReport, CycleBudget,
};
use crate::services::blockage::BlockageLedger;
use crate::services::expansion::ExpansionScorer;
use crate::services::history::HistoryAggregator;
use crate::services::production::{ProductionArbiter, ProductionOutcome};
use crate::services::scoring::{PriorityScorer, ZoneMode};

/// Per-pass inputs that do not come from the world snapshot.
#[derive(Debug, Clone, Copy)]
pub struct PassInputs {
    pub cycle: u64,
    pub compute_average: f64,
    /// Externally requested defense-production score.
    pub defense_override: Option<f64>,
    pub budget: CycleBudget,
}

impl PassInputs {
    pub fn new(cycle: u64, compute_average: f64) -> Self {
        Self {
            cycle,
            compute_average,
            defense_override: None,
            budget: CycleBudget::unlimited(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionReport {
    pub zone: ZoneId,
    pub cycle: u64,
    pub siege: bool,
    /// Scores after assignment, as recorded into history.
    pub priorities: PrioritySet,
    pub production_priorities: ProductionPriorities,
    pub assignment: AssignmentReport,
    pub production: ProductionOutcome,
    pub scout_requested: bool,
}

#[derive(Debug, Clone)]
pub struct DecisionPass {
    config: EngineConfig,
    catalog: TaskCatalog,
    scorer: PriorityScorer,
    expansion: ExpansionScorer,
    history: HistoryAggregator,
    assignment: AssignmentEngine,
    production: ProductionArbiter,
    ledger: BlockageLedger,
}

impl DecisionPass {
    pub fn new(config: EngineConfig, catalog: TaskCatalog) -> Self {
        Self {
            scorer: PriorityScorer::new(config.clone()),
            expansion: ExpansionScorer::new(config.clone()),
            history: HistoryAggregator::new(config.history_depth),
            assignment: AssignmentEngine::new(config.clone()),
            production: ProductionArbiter::new(config.clone()),
            ledger: BlockageLedger::from_config(&config),
            catalog,
            config,
        }
    }

    pub fn catalog(&self) -> &TaskCatalog {
        &self.catalog
    }

    pub fn assignment(&self) -> &AssignmentEngine {
        &self.assignment
    }

    pub fn scorer(&self) -> &PriorityScorer {
        &self.scorer
    }

    /// Run one decision pass for `state.zone`. Returns `None` when the world
    /// has no snapshot of the zone this cycle.
    pub fn run<W: World>(
        &self,
        world: &mut W,
        state: &mut ZoneState,
        inputs: PassInputs,
    ) -> Option<DecisionReport> {
        let zone = state.zone.clone();
        let snapshot = world.snapshot(&zone)?;
        let target = snapshot.expansion_target().cloned();
        let view = snapshot.view;
        let mut units = snapshot.units;
        let census = UnitCensus::from_units(&units);
        let cycle = inputs.cycle;

        let expansion = self
            .expansion
            .score(&view, target.as_ref(), state, &*world);

        let scout_requested = match &target {
            Some(target) if target.observed.is_none() => {
                self.direct_scouts(target, &mut units, &census, state, cycle)
            }
            _ => false,
        };

        let mut set = self.scorer.score_zone(&self.catalog, &view, expansion);

        let defense = self
            .scorer
            .defense_spawning(&view, &census, inputs.defense_override);
        let mut production_priorities = self.history.averaged_production(state, &census, defense);
        if scout_requested {
            production_priorities.raise(TaskKind::ScoutSpawning, self.config.scout_spawn_score);
        }

        let settling_ready = target
            .as_ref()
            .and_then(|t| t.observed.as_ref())
            .is_some_and(|observed| observed.ready_for_settling);
        let mut budget = inputs.budget;
        let assignment = {
            let ctx = AssignmentContext {
                view: &view,
                census: &census,
                settling_ready,
                cycle,
                pathing: &*world,
            };
            self.assignment
                .assign(&mut set, &mut units, state, &ctx, &mut budget)
        };

        let production = self.production.execute(
            &view,
            &census,
            &production_priorities,
            inputs.compute_average,
            world,
        );

        let blocked: Vec<TaskKind> = set
            .tasks()
            .filter(|&task| self.ledger.is_blocked(state, task, cycle))
            .collect();
        for task in blocked {
            set.zero(task);
        }
        self.history.record(state, set.clone());
        state.touch();

        world.commit_units(&zone, units);

        let siege = ZoneMode::of(&view, &self.config) == ZoneMode::Siege;
        info!(
            zone = %zone,
            cycle,
            siege,
            bound = assignment.outcomes.len(),
            truncated = assignment.truncated,
            "decision pass complete"
        );

        Some(DecisionReport {
            zone,
            cycle,
            siege,
            priorities: set,
            production_priorities,
            assignment,
            production,
            scout_requested,
        })
    }

    /// Send an idle scout to an unobserved target, or ask for one.
    ///
    /// Returns whether scout production should be raised this pass.
    fn direct_scouts(
        &self,
        target: &ExpansionTarget,
        units: &mut [Unit],
        census: &UnitCensus,
        state: &mut ZoneState,
        cycle: u64,
    ) -> bool {
        let idle_scout = units
            .iter_mut()
            .find(|u| u.unit_type == UnitType::Scout && u.binding == TaskBinding::Unbound);

        if let Some(scout) = idle_scout {
            scout.rebind(TaskKind::Scouting);
            scout.scouting_target = Some(target.flag.clone());
            debug!(zone = %state.zone, unit = %scout.id, target = %target.flag, "scout sent to expansion target");
            return false;
        }

        let due = state
            .last_scout_request
            .map_or(true, |last| cycle.saturating_sub(last) > self.config.scout_request_interval);
        if census.count(UnitType::Worker) >= 1 && due {
            state.last_scout_request = Some(cycle);
            debug!(zone = %state.zone, cycle, "scout requested for unobserved expansion target");
            return true;
        }
        false
    }
}
