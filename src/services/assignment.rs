//! Binding units to objectives.
//!
//! One pass per zone: pinned roles first (transporter, upgrader, link
//! operator), then a greedy scored pass over the remaining units with a
//! hysteresis bias against rebinding and a per-claim score decrement.
//! Every unit's binding step is self-contained, so stopping early on an
//! exhausted [`CycleBudget`] leaves the zone consistent.

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::models::{
    EngineConfig, ExpansionKind, PriorityRecord, PrioritySet, Position, Role, SquadSpecification,
    StructureKind, TaskBinding, TaskKind, Unit, UnitCensus, UnitType, ZoneState, ZoneView,
};
use crate::domain::ports::PathCost;
use crate::services::blockage::BlockageLedger;

/// Remaining units of binding work allowed in the current cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleBudget {
    remaining: Option<usize>,
}

impl CycleBudget {
    pub fn unlimited() -> Self {
        Self { remaining: None }
    }

    pub fn with_limit(steps: usize) -> Self {
        Self {
            remaining: Some(steps),
        }
    }

    /// Take one step; `false` once the budget is spent.
    pub fn try_consume(&mut self) -> bool {
        match &mut self.remaining {
            None => true,
            Some(0) => false,
            Some(n) => {
                *n -= 1;
                true
            }
        }
    }
}

/// Live facts the assignment pass reads besides the scores.
pub struct AssignmentContext<'a> {
    pub view: &'a ZoneView,
    pub census: &'a UnitCensus,
    /// The expansion target is claimed and suitable for workers to settle.
    pub settling_ready: bool,
    pub cycle: u64,
    pub pathing: &'a dyn PathCost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Transporter,
    Upgrader,
    LinkOperator,
    Rebound,
    Kept,
    Unassigned,
}

/// What happened to one unit during a pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentOutcome {
    pub unit: String,
    pub task: Option<TaskKind>,
    pub kind: OutcomeKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssignmentReport {
    pub outcomes: Vec<AssignmentOutcome>,
    /// The budget ran out before every eligible unit was visited.
    pub truncated: bool,
}

impl AssignmentReport {
    pub fn outcome(&self, unit: &str) -> Option<&AssignmentOutcome> {
        self.outcomes.iter().find(|o| o.unit == unit)
    }
}

#[derive(Debug, Clone)]
pub struct AssignmentEngine {
    config: EngineConfig,
    ledger: BlockageLedger,
}

impl Default for AssignmentEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl AssignmentEngine {
    pub fn new(config: EngineConfig) -> Self {
        let ledger = BlockageLedger::from_config(&config);
        Self { config, ledger }
    }

    /// Bind the zone's units for this cycle. `set` is consumed as budget:
    /// every claim lowers the claimed objective's score.
    pub fn assign(
        &self,
        set: &mut PrioritySet,
        units: &mut [Unit],
        state: &mut ZoneState,
        ctx: &AssignmentContext<'_>,
        budget: &mut CycleBudget,
    ) -> AssignmentReport {
        let mut report = AssignmentReport::default();
        state.pinned_roles = Default::default();
        if units.is_empty() {
            return report;
        }

        let view = ctx.view;
        let storage_energy = view.storage_energy();

        let mut upgrade_taken = storage_energy.is_some_and(|e| {
            e <= self.config.upgrade_throttle_storage
                && view.controller.ticks_to_downgrade >= self.config.upgrade_throttle_ticks
        }) || units
            .iter()
            .any(|u| u.binding.is_bound_to(TaskKind::ControllerUpgrading));
        if upgrade_taken {
            set.zero(TaskKind::ControllerUpgrading);
        }

        let mut receiver_taken = storage_energy
            .is_some_and(|e| e <= self.config.receiver_throttle_storage && !view.has_hostiles())
            || units
                .iter()
                .any(|u| u.binding.is_bound_to(TaskKind::ReceiverOperation));
        if receiver_taken {
            set.zero(TaskKind::ReceiverOperation);
        }

        let mut eligible: Vec<usize> = units
            .iter()
            .enumerate()
            .filter(|(_, u)| u.unit_type != UnitType::Scout && !u.pinned && !u.returning_from_remote)
            .map(|(i, _)| i)
            .collect();

        // Smallest body takes the upgrader slot so larger ones stay in
        // scored competition.
        if !upgrade_taken && eligible.len() > 1 {
            let weakest = (0..eligible.len())
                .min_by_key(|&pos| units[eligible[pos]].body_size)
                .unwrap_or(0);
            eligible.swap(weakest, 1);
        }

        let mut transport_taken = false;

        for index in eligible {
            if !budget.try_consume() {
                report.truncated = true;
                info!(zone = %view.zone, cycle = ctx.cycle, "assignment budget exhausted; deferring remaining units");
                break;
            }
            let unit = &mut units[index];
            let is_worker = unit.unit_type == UnitType::Worker;

            if is_worker && !transport_taken {
                transport_taken = true;
                let task = if view.storage.is_some() {
                    TaskKind::EnergyTransferring
                } else {
                    TaskKind::ControllerUpgrading
                };
                unit.no_idling = true;
                unit.rebind(task);
                state.pinned_roles.transporter_bound = true;
                report.outcomes.push(outcome(unit, OutcomeKind::Transporter));
                continue;
            }

            if is_worker && !upgrade_taken {
                upgrade_taken = true;
                unit.no_idling = true;
                unit.pinned = true;
                unit.rebind(TaskKind::ControllerUpgrading);
                set.zero(TaskKind::ControllerUpgrading);
                state.pinned_roles.upgrader_bound = true;
                report.outcomes.push(outcome(unit, OutcomeKind::Upgrader));
                continue;
            }

            if is_worker && !receiver_taken {
                receiver_taken = true;
                if let Some(link) = self.select_receiver(ctx) {
                    if self.walls_maxed_near(view, &link) {
                        debug!(zone = %view.zone, link = %link, "walls near receiver maxed; skipping link operator");
                        unit.source_link = None;
                    } else {
                        unit.source_link = Some(link);
                        unit.no_idling = true;
                        unit.pinned = true;
                        unit.rebind(TaskKind::ReceiverOperation);
                        state.pinned_roles.link_operator_bound = true;
                        report.outcomes.push(outcome(unit, OutcomeKind::LinkOperator));
                        continue;
                    }
                }
            }

            unit.no_idling = false;
            let kind = self.update_assignment(set, unit, state, ctx);
            report.outcomes.push(outcome(unit, kind));
        }

        report
    }

    /// Keep or rebind one unit according to the hysteresis rule.
    fn update_assignment(
        &self,
        set: &mut PrioritySet,
        unit: &mut Unit,
        state: &ZoneState,
        ctx: &AssignmentContext<'_>,
    ) -> OutcomeKind {
        let Some((best, best_score)) = self.best_task(set, unit, state, ctx) else {
            return if unit.current_task().is_some() {
                OutcomeKind::Kept
            } else {
                OutcomeKind::Unassigned
            };
        };

        let current = unit
            .current_task()
            .and_then(|task| set.score(task).map(|score| (task, score)));

        match current {
            Some((task, score)) if best_score - score <= self.config.hysteresis_margin => {
                set.decrement(task, self.config.claim_decrement);
                OutcomeKind::Kept
            }
            _ => {
                debug!(
                    unit = %unit.id,
                    from = ?unit.current_task(),
                    to = %best,
                    score = best_score,
                    "rebinding unit"
                );
                unit.rebind(best);
                set.decrement(best, self.config.claim_decrement);
                OutcomeKind::Rebound
            }
        }
    }

    /// Highest-scoring objective the unit may take, ties to the earliest
    /// catalog entry. Falls back to upgrading at a fixed score when nothing
    /// scores at least the idle floor threshold.
    pub fn best_task(
        &self,
        set: &PrioritySet,
        unit: &Unit,
        state: &ZoneState,
        ctx: &AssignmentContext<'_>,
    ) -> Option<(TaskKind, f64)> {
        let mut best: Option<(TaskKind, f64)> = None;
        for record in set.iter() {
            if !self.suitable(record, unit, ctx)
                || self.ledger.is_blocked(state, record.task, ctx.cycle)
                || !self.squad_ready(record, ctx.census)
            {
                continue;
            }
            match best {
                Some((_, top)) if record.score <= top => {}
                _ => best = Some((record.task, record.score)),
            }
        }

        let below_floor = best.map_or(true, |(_, score)| score < self.config.idle_floor_threshold);
        if below_floor && Role::Worker.accepts(unit.unit_type) && !unit.returning_from_remote {
            return Some((TaskKind::ControllerUpgrading, self.config.upgrade_floor_score));
        }
        best
    }

    fn suitable(&self, record: &PriorityRecord, unit: &Unit, ctx: &AssignmentContext<'_>) -> bool {
        if unit.returning_from_remote {
            return false;
        }
        if record.task == TaskKind::InfluenceExpansion
            && record.expansion_kind == Some(ExpansionKind::Settling)
        {
            return unit.unit_type == UnitType::Claimer
                || (unit.unit_type == UnitType::Worker && ctx.settling_ready);
        }
        record
            .task
            .role()
            .is_some_and(|role| role.accepts(unit.unit_type))
    }

    /// Aggressive expansion waits for its squad.
    fn squad_ready(&self, record: &PriorityRecord, census: &UnitCensus) -> bool {
        match record.expansion_kind.and_then(SquadSpecification::for_expansion) {
            Some(squad) => squad.is_assembled(census),
            None => true,
        }
    }

    /// Receiver link the link operator should service, if any.
    ///
    /// The receiver closest to the controller feeds upgrading and is left
    /// alone once a controller link is placed.
    fn select_receiver(&self, ctx: &AssignmentContext<'_>) -> Option<Position> {
        let view = ctx.view;
        let mut receivers = view.receiver_links.clone();

        if view.placed_controller_link && !receivers.is_empty() {
            if let Some(controller) = &view.controller_pos {
                let closest = receivers
                    .iter()
                    .enumerate()
                    .map(|(i, r)| {
                        let path = ctx
                            .pathing
                            .path_cost(r, std::slice::from_ref(controller), 1, true);
                        (i, if path.reachable { path.cost } else { 100_000.0 })
                    })
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(i, _)| i);
                if let Some(i) = closest {
                    receivers.remove(i);
                }
            }
        }

        if receivers.is_empty() {
            return None;
        }

        if view.has_hostiles() {
            receivers
                .into_iter()
                .min_by_key(|r| {
                    view.hostiles
                        .iter()
                        .map(|h| r.range_to(&h.pos))
                        .min()
                        .unwrap_or(u32::MAX)
                })
        } else {
            let index = usize::try_from(ctx.cycle % receivers.len() as u64).unwrap_or(0);
            receivers.into_iter().nth(index)
        }
    }

    /// Every wall and rampart near the link is at the desired durability.
    /// No barriers at all counts as maxed.
    fn walls_maxed_near(&self, view: &ZoneView, link: &Position) -> bool {
        view.barriers
            .iter()
            .filter(|b| matches!(b.kind, StructureKind::Wall | StructureKind::Rampart))
            .filter(|b| b.pos.in_range(link, self.config.wall_scan_range))
            .all(|b| b.hits >= self.config.desired_wall_hits)
    }

    /// Re-evaluate a suspended unit against the most recent snapshot.
    ///
    /// The objective it gave up on is zeroed across the whole retained
    /// window so it does not immediately attract other idle units.
    pub fn reassign_suspended(
        &self,
        unit: &mut Unit,
        state: &mut ZoneState,
        ctx: &AssignmentContext<'_>,
    ) -> Option<TaskKind> {
        if unit.binding != TaskBinding::Suspended {
            return None;
        }
        let mut latest = state.latest_priorities()?.clone();

        let assigned = self.best_task(&latest, unit, state, ctx).map(|(task, _)| {
            unit.rebind(task);
            latest.decrement(task, self.config.claim_decrement);
            task
        });

        if let Some(slot) = state.priority_history.back_mut() {
            *slot = latest;
        }

        if let Some(abandoned) = unit.previous_task {
            for set in &mut state.priority_history {
                set.zero(abandoned);
            }
        }

        if let Some(task) = assigned {
            debug!(unit = %unit.id, task = %task, abandoned = ?unit.previous_task, "suspended unit reassigned");
        }
        assigned
    }
}

fn outcome(unit: &Unit, kind: OutcomeKind) -> AssignmentOutcome {
    AssignmentOutcome {
        unit: unit.id.clone(),
        task: unit.current_task(),
        kind,
    }
}
