//! Handling of signals reported by behavior executors.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::domain::models::{EngineConfig, TaskKind, Unit, ZoneState};
use crate::domain::ports::ExecutorSignal;
use crate::services::blockage::BlockageLedger;
use crate::services::rate_limiter::{CallLimiter, LimitAction, LimitDecision, LimitKey, LimitPolicy};

/// Effect a single signal had on the zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "effect")]
pub enum FeedbackEffect {
    /// Unknown unit, unbound unit, or a unit exempt from idling.
    Ignored,
    /// Unit suspended and the objective blocked for the blockage duration.
    Suspended { task: TaskKind },
    /// Unsafe report counted, still below the escalation threshold.
    Counted { task: TaskKind, reports: u32 },
    /// Unit suspended and the objective blocked until the next full reset.
    Escalated { task: TaskKind },
    /// Stall recorded; the unit keeps its objective for now.
    StallRecorded { task: TaskKind },
}

#[derive(Debug, Clone)]
pub struct FeedbackHandler {
    ledger: BlockageLedger,
    unsafe_threshold: u32,
    stalls: CallLimiter,
}

impl Default for FeedbackHandler {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl FeedbackHandler {
    pub fn new(config: &EngineConfig) -> Self {
        let stalls = CallLimiter::new(LimitPolicy::Consecutive {
            max_calls: config.stall_limit,
            adjacency_margin: config.stall_adjacency_margin,
        })
        .clearing_on_limit();
        Self {
            ledger: BlockageLedger::from_config(config),
            unsafe_threshold: config.unsafe_escalation_threshold,
            stalls,
        }
    }

    pub fn handle(
        &mut self,
        signal: &ExecutorSignal,
        units: &mut [Unit],
        state: &mut ZoneState,
        now: u64,
    ) -> FeedbackEffect {
        let Some(unit) = units.iter_mut().find(|u| u.id == signal.unit_id()) else {
            debug!(zone = %state.zone, unit = signal.unit_id(), "signal for unknown unit ignored");
            return FeedbackEffect::Ignored;
        };

        match signal {
            ExecutorSignal::Idle(_) => self.idle(unit, state, now),
            ExecutorSignal::Unsafe(_) => self.unsafe_path(unit, state, now),
            ExecutorSignal::Stalled(_) => self.stalled(unit, state, now),
        }
    }

    fn idle(&self, unit: &mut Unit, state: &mut ZoneState, now: u64) -> FeedbackEffect {
        if unit.no_idling {
            return FeedbackEffect::Ignored;
        }
        let Some(task) = unit.current_task() else {
            return FeedbackEffect::Ignored;
        };
        unit.suspend();
        self.ledger.mark_blocked(state, task, now, false);
        debug!(zone = %state.zone, unit = %unit.id, task = %task, cycle = now, "unit idled");
        FeedbackEffect::Suspended { task }
    }

    fn unsafe_path(&self, unit: &mut Unit, state: &mut ZoneState, now: u64) -> FeedbackEffect {
        let Some(task) = unit.current_task() else {
            return FeedbackEffect::Ignored;
        };
        let reports = state.unsafe_reports.entry(task).or_insert(0);
        *reports += 1;
        let reports = *reports;

        if reports <= self.unsafe_threshold {
            return FeedbackEffect::Counted { task, reports };
        }

        warn!(
            zone = %state.zone,
            unit = %unit.id,
            task = %task,
            reports,
            "objective repeatedly unreachable safely; blocking permanently"
        );
        unit.suspend();
        self.ledger.mark_blocked(state, task, now, true);
        FeedbackEffect::Escalated { task }
    }

    fn stalled(&mut self, unit: &mut Unit, state: &mut ZoneState, now: u64) -> FeedbackEffect {
        let Some(task) = unit.current_task() else {
            return FeedbackEffect::Ignored;
        };
        let key = LimitKey::new(unit.id.clone(), task, LimitAction::Approach);
        match self.stalls.call(key, now) {
            LimitDecision::Allowed => FeedbackEffect::StallRecorded { task },
            LimitDecision::Limited => self.idle(unit, state, now),
        }
    }

    /// Drop stall history of every unit not in `live`. Returns how many
    /// limiter keys were dropped.
    pub fn retain_units(&mut self, live: &BTreeSet<String>) -> usize {
        let dropped = self.stalls.retain_scopes(|unit| live.contains(unit));
        if dropped > 0 {
            debug!(dropped, "stall history of vanished units dropped");
        }
        dropped
    }

    pub fn stalls_recorded(&self, unit_id: &str) -> usize {
        self.stalls.recorded_in_scope(unit_id)
    }
}
