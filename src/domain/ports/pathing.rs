use crate::domain::models::Position;

/// Outcome of a path query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathResult {
    pub cost: f64,
    pub reachable: bool,
}

impl PathResult {
    pub fn reachable(cost: f64) -> Self {
        Self {
            cost,
            reachable: true,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            cost: f64::INFINITY,
            reachable: false,
        }
    }
}

/// Movement collaborator. Treated as a black box; may report unreachable.
pub trait PathCost {
    /// Cost of travelling from `origin` to within `range` of any of
    /// `targets`. With `safe` set, routes through hostile-controlled
    /// terrain are rejected.
    fn path_cost(&self, origin: &Position, targets: &[Position], range: u32, safe: bool)
        -> PathResult;
}
