use serde::{Deserialize, Serialize};

use crate::domain::models::{Unit, ZoneId, ZoneSnapshot};
use crate::domain::ports::manufacture::Manufacturer;
use crate::domain::ports::pathing::PathCost;

/// Feedback from a behavior executor about one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "signal", content = "unit")]
pub enum ExecutorSignal {
    /// Could not progress on its bound objective.
    Idle(String),
    /// A safety constraint was violated while pursuing the objective.
    Unsafe(String),
    /// Failed to approach its target this cycle.
    Stalled(String),
}

impl ExecutorSignal {
    pub fn unit_id(&self) -> &str {
        match self {
            Self::Idle(id) | Self::Unsafe(id) | Self::Stalled(id) => id,
        }
    }
}

/// Read-mostly view of the simulated world for the current cycle.
///
/// Snapshots are valid for one cycle only and must not be retained.
pub trait World: PathCost + Manufacturer {
    /// Current world cycle.
    fn cycle(&self) -> u64;

    /// Zones owned by the colony, in a stable order.
    fn zones(&self) -> Vec<ZoneId>;

    fn snapshot(&self, zone: &ZoneId) -> Option<ZoneSnapshot>;

    /// Write back the engine-owned part of the units' memory.
    fn commit_units(&mut self, zone: &ZoneId, units: Vec<Unit>);

    /// Take all executor feedback collected for a zone since the last call.
    fn drain_signals(&mut self, zone: &ZoneId) -> Vec<ExecutorSignal>;

    /// Fraction of the compute allotment used this cycle, if measured.
    fn compute_usage(&self) -> Option<f64>;

    /// Step the world to the next cycle.
    fn advance(&mut self);
}
