//! Engine services: scoring, assignment, production and their scheduling.

pub mod assignment;
pub mod blockage;
pub mod compute_monitor;
pub mod cycle;
pub mod decision;
pub mod expansion;
pub mod feedback;
pub mod history;
pub mod production;
pub mod rate_limiter;
pub mod runner;
pub mod scoring;

pub use assignment::{
    AssignmentContext, AssignmentEngine, AssignmentOutcome, AssignmentReport, CycleBudget,
    OutcomeKind,
};
pub use blockage::BlockageLedger;
pub use compute_monitor::ComputeMonitor;
pub use cycle::{CycleReport, CycleScheduler, MaintenanceEvent, SignalRecord};
pub use decision::{DecisionPass, DecisionReport, PassInputs};
pub use expansion::{defense_measure, ExpansionScorer};
pub use feedback::{FeedbackEffect, FeedbackHandler};
pub use history::{dominant_expansion_kind, HistoryAggregator};
pub use production::{max_workers, ProductionArbiter, ProductionOutcome, SkipReason};
pub use rate_limiter::{CallLimiter, LimitAction, LimitDecision, LimitKey, LimitPolicy};
pub use runner::CycleRunner;
pub use scoring::{PriorityScorer, ZoneMode};
