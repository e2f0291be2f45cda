//! Cycle scheduling.
//!
//! Every cycle each zone gets executor feedback applied and its suspended
//! units re-evaluated. Heavier work runs on fixed cycle intervals: blockage
//! sweeps, emergency defense, the round-robin decision pass, the siege early
//! pass and the maintenance resets.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::errors::CatalogError;
use crate::domain::models::{
    Config, ScheduleConfig, TaskBinding, TaskCatalog, TaskKind, UnitCensus, UnitType, ZoneId,
    ZoneState,
};
use crate::domain::ports::{ExecutorSignal, World};
use crate::services::assignment::{AssignmentContext, CycleBudget};
use crate::services::blockage::BlockageLedger;
use crate::services::compute_monitor::ComputeMonitor;
use crate::services::decision::{DecisionPass, DecisionReport, PassInputs};
use crate::services::feedback::{FeedbackEffect, FeedbackHandler};
use crate::services::scoring::ZoneMode;

/// Applied executor signal and what it did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRecord {
    pub zone: ZoneId,
    pub signal: ExecutorSignal,
    pub effect: FeedbackEffect,
}

/// Everything that happened during one cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub signals: Vec<SignalRecord>,
    /// Suspended units bound to a new objective, by unit id.
    pub reassigned: Vec<(String, TaskKind)>,
    pub decisions: Vec<DecisionReport>,
    /// Units force-bound to defense.
    pub defenders: usize,
    pub swept_blocks: usize,
    pub maintenance: Vec<MaintenanceEvent>,
    pub compute_transgression: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceEvent {
    UnsafeCountersReset,
    BlockagesReset,
    AnchorsReset,
}

/// Drives all zones of a world through cycles.
#[derive(Debug, Clone)]
pub struct CycleScheduler {
    schedule: ScheduleConfig,
    decision: DecisionPass,
    ledger: BlockageLedger,
    feedback: FeedbackHandler,
    compute: ComputeMonitor,
    defense_overrides: BTreeMap<ZoneId, f64>,
    step_budget: Option<usize>,
    next_zone: usize,
}

impl CycleScheduler {
    pub fn new(config: &Config) -> Result<Self, CatalogError> {
        Ok(Self::with_catalog(config, TaskCatalog::standard()?))
    }

    pub fn with_catalog(config: &Config, catalog: TaskCatalog) -> Self {
        let engine = &config.engine;
        Self {
            schedule: config.schedule.clone(),
            decision: DecisionPass::new(engine.clone(), catalog),
            ledger: BlockageLedger::from_config(engine),
            feedback: FeedbackHandler::new(engine),
            compute: ComputeMonitor::new(config.schedule.compute_window),
            defense_overrides: BTreeMap::new(),
            step_budget: None,
            next_zone: 0,
        }
    }

    /// Cap the number of units bound per decision pass.
    pub fn with_step_budget(mut self, steps: usize) -> Self {
        self.step_budget = Some(steps);
        self
    }

    pub fn decision_pass(&self) -> &DecisionPass {
        &self.decision
    }

    pub fn compute(&self) -> &ComputeMonitor {
        &self.compute
    }

    /// Request defense production in `zone` with at least `score`.
    pub fn override_defense(&mut self, zone: ZoneId, score: f64) {
        self.defense_overrides.insert(zone, score);
    }

    pub fn clear_defense_override(&mut self, zone: &ZoneId) {
        self.defense_overrides.remove(zone);
    }

    /// Run the current world cycle. `states` gains an entry for every zone
    /// the world reports that it did not contain yet.
    pub fn run_cycle<W: World>(
        &mut self,
        world: &mut W,
        states: &mut BTreeMap<ZoneId, ZoneState>,
    ) -> CycleReport {
        self.run_cycle_excluding(world, states, &BTreeSet::new())
    }

    /// Like [`CycleScheduler::run_cycle`], leaving the `excluded` zones
    /// untouched this cycle.
    pub fn run_cycle_excluding<W: World>(
        &mut self,
        world: &mut W,
        states: &mut BTreeMap<ZoneId, ZoneState>,
        excluded: &BTreeSet<ZoneId>,
    ) -> CycleReport {
        let cycle = world.cycle();
        let zones: Vec<ZoneId> = world
            .zones()
            .into_iter()
            .filter(|zone| !excluded.contains(zone))
            .collect();
        let mut report = CycleReport {
            cycle,
            ..CycleReport::default()
        };

        for zone in &zones {
            let state = states
                .entry(zone.clone())
                .or_insert_with(|| ZoneState::new(zone.clone()));
            self.upkeep(world, state, cycle, &mut report);
        }

        let due = |interval: u64| interval > 0 && cycle % interval == 0;

        if due(self.schedule.sweep_interval) {
            for zone in &zones {
                if let Some(state) = states.get_mut(zone) {
                    report.swept_blocks += self.ledger.sweep(state, cycle);
                }
            }
            self.prune_stall_history(&*world);
        }

        if due(self.schedule.unsafe_reset_interval) {
            for zone in &zones {
                if let Some(state) = states.get_mut(zone) {
                    state.unsafe_reports.clear();
                }
            }
            report.maintenance.push(MaintenanceEvent::UnsafeCountersReset);
        }
        if due(self.schedule.full_reset_interval) {
            for zone in &zones {
                if let Some(state) = states.get_mut(zone) {
                    self.ledger.reset(state);
                }
            }
            report.maintenance.push(MaintenanceEvent::BlockagesReset);
        }
        if due(self.schedule.anchor_reset_interval) {
            for zone in &zones {
                if let Some(state) = states.get_mut(zone) {
                    state.banned_anchors.clear();
                }
            }
            report.maintenance.push(MaintenanceEvent::AnchorsReset);
        }

        if due(self.schedule.decision_interval) && !zones.is_empty() {
            let zone = &zones[self.next_zone % zones.len()];
            self.next_zone = (self.next_zone + 1) % zones.len();
            if let Some(state) = states.get_mut(zone) {
                if let Some(decision) = self.decide(world, state, cycle) {
                    report.decisions.push(decision);
                }
            }
        }

        if due(self.schedule.siege_interval) {
            // A zone gets at most one pass, and one history entry, per cycle.
            let decided: BTreeSet<ZoneId> =
                report.decisions.iter().map(|d| d.zone.clone()).collect();
            let candidates: Vec<ZoneId> = zones
                .iter()
                .filter(|zone| !decided.contains(*zone))
                .cloned()
                .collect();
            if let Some(decision) = self.siege_pass(world, &candidates, states, cycle, &mut report) {
                report.decisions.push(decision);
            }
        }

        // Runs after the decision passes so forced bindings stand this cycle.
        if due(self.schedule.defense_interval) {
            for zone in &zones {
                report.defenders += self.defend(world, zone);
            }
        }

        if let Some(usage) = world.compute_usage() {
            report.compute_transgression = self.compute.record(cycle, usage);
        }

        report
    }

    fn decide<W: World>(
        &self,
        world: &mut W,
        state: &mut ZoneState,
        cycle: u64,
    ) -> Option<DecisionReport> {
        let mut inputs = PassInputs::new(cycle, self.compute.average());
        inputs.defense_override = self.defense_overrides.get(&state.zone).copied();
        if let Some(steps) = self.step_budget {
            inputs.budget = CycleBudget::with_limit(steps);
        }
        let report = self.decision.run(world, state, inputs);
        if report.is_none() {
            warn!(zone = %state.zone, cycle, "zone not visible; decision pass skipped");
        }
        report
    }

    /// Apply executor signals and re-evaluate suspended units.
    fn upkeep<W: World>(
        &mut self,
        world: &mut W,
        state: &mut ZoneState,
        cycle: u64,
        report: &mut CycleReport,
    ) {
        let signals = world.drain_signals(&state.zone);
        let Some(snapshot) = world.snapshot(&state.zone) else {
            if !signals.is_empty() {
                warn!(zone = %state.zone, dropped = signals.len(), "signals for invisible zone dropped");
            }
            return;
        };
        let settling_ready = snapshot
            .expansion_target()
            .and_then(|t| t.observed.as_ref())
            .is_some_and(|observed| observed.ready_for_settling);
        let view = snapshot.view;
        let mut units = snapshot.units;

        for signal in signals {
            let effect = self.feedback.handle(&signal, &mut units, state, cycle);
            report.signals.push(SignalRecord {
                zone: state.zone.clone(),
                signal,
                effect,
            });
        }

        if units.iter().any(|u| u.binding == TaskBinding::Suspended) {
            let census = UnitCensus::from_units(&units);
            let ctx = AssignmentContext {
                view: &view,
                census: &census,
                settling_ready,
                cycle,
                pathing: &*world,
            };
            for unit in units
                .iter_mut()
                .filter(|u| u.binding == TaskBinding::Suspended)
            {
                if let Some(task) = self.decision.assignment().reassign_suspended(unit, state, &ctx) {
                    report.reassigned.push((unit.id.clone(), task));
                }
            }
        }

        world.commit_units(&state.zone, units);
    }

    /// Drop stall history of units no longer present in any zone. Skipped
    /// while some zone is not visible, since its units cannot be told apart
    /// from dead ones.
    fn prune_stall_history<W: World>(&mut self, world: &W) {
        let mut live = BTreeSet::new();
        for zone in world.zones() {
            let Some(snapshot) = world.snapshot(&zone) else {
                return;
            };
            live.extend(snapshot.units.into_iter().map(|u| u.id));
        }
        self.feedback.retain_units(&live);
    }

    /// Early pass for the first sieged zone whose production facility is idle.
    fn siege_pass<W: World>(
        &self,
        world: &mut W,
        zones: &[ZoneId],
        states: &mut BTreeMap<ZoneId, ZoneState>,
        cycle: u64,
        report: &mut CycleReport,
    ) -> Option<DecisionReport> {
        let engine = self.decision.scorer().config();
        for zone in zones {
            let Some(snapshot) = world.snapshot(zone) else {
                continue;
            };
            if ZoneMode::of(&snapshot.view, engine) != ZoneMode::Siege {
                continue;
            }
            let state = states.get_mut(zone)?;
            report.swept_blocks += self.ledger.sweep(state, cycle);

            let spawn_idle = snapshot.view.spawn.as_ref().is_some_and(|s| !s.busy);
            if spawn_idle {
                info!(zone = %zone, cycle, "zone under siege; running early decision pass");
                return self.decide(world, state, cycle);
            }
        }
        None
    }

    /// Bind every bruiser in a zone with hostiles to defense.
    fn defend<W: World>(&self, world: &mut W, zone: &ZoneId) -> usize {
        let Some(snapshot) = world.snapshot(zone) else {
            return 0;
        };
        if !snapshot.view.has_hostiles() {
            return 0;
        }
        let mut units = snapshot.units;
        let mut forced = 0;
        for unit in units
            .iter_mut()
            .filter(|u| u.unit_type == UnitType::Bruiser)
        {
            unit.rebind(TaskKind::CreepDefense);
            forced += 1;
        }
        if forced > 0 {
            debug!(zone = %zone, forced, "bruisers bound to defense");
            world.commit_units(zone, units);
        }
        forced
    }
}
