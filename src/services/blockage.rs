//! Suppression of objectives that currently cannot be fulfilled.

use tracing::debug;

use crate::domain::models::{BlockageEntry, EngineConfig, TaskKind, ZoneState};

/// Records and expires per-zone objective blocks.
///
/// A non-permanent block recorded at cycle `T` holds for every cycle in
/// `[T, T + duration)`. Permanent blocks hold until [`BlockageLedger::reset`].
#[derive(Debug, Clone, Copy)]
pub struct BlockageLedger {
    duration: u64,
}

impl Default for BlockageLedger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl BlockageLedger {
    pub fn new(duration: u64) -> Self {
        Self { duration }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.blockage_duration)
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Record a block. A permanent entry is never downgraded by a later
    /// non-permanent one.
    pub fn mark_blocked(&self, state: &mut ZoneState, task: TaskKind, now: u64, permanent: bool) {
        let entry = state
            .blockage_ledger
            .entry(task)
            .or_insert(BlockageEntry {
                cycle: now,
                permanent,
            });
        if !entry.permanent {
            entry.cycle = now;
            entry.permanent = permanent;
        }
        debug!(zone = %state.zone, task = %task, cycle = now, permanent, "objective blocked");
    }

    pub fn is_blocked(&self, state: &ZoneState, task: TaskKind, now: u64) -> bool {
        state
            .blockage_ledger
            .get(&task)
            .is_some_and(|entry| self.holds(entry, now))
    }

    fn holds(&self, entry: &BlockageEntry, now: u64) -> bool {
        entry.permanent || now < entry.cycle.saturating_add(self.duration)
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn sweep(&self, state: &mut ZoneState, now: u64) -> usize {
        let before = state.blockage_ledger.len();
        state
            .blockage_ledger
            .retain(|_, entry| self.holds(entry, now));
        let removed = before - state.blockage_ledger.len();
        if removed > 0 {
            debug!(zone = %state.zone, removed, cycle = now, "expired blocks swept");
        }
        removed
    }

    /// Clear every entry, permanent ones included.
    pub fn reset(&self, state: &mut ZoneState) -> usize {
        let removed = state.blockage_ledger.len();
        state.blockage_ledger.clear();
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ZoneId;

    fn state() -> ZoneState {
        ZoneState::new(ZoneId::new("W1N1"))
    }

    #[test]
    fn test_block_holds_for_duration() {
        let ledger = BlockageLedger::new(100);
        let mut state = state();
        ledger.mark_blocked(&mut state, TaskKind::RoadConstruction, 500, false);

        assert!(ledger.is_blocked(&state, TaskKind::RoadConstruction, 500));
        assert!(ledger.is_blocked(&state, TaskKind::RoadConstruction, 599));
        assert!(!ledger.is_blocked(&state, TaskKind::RoadConstruction, 600));
        assert!(!ledger.is_blocked(&state, TaskKind::TowerRefueling, 500));
    }

    #[test]
    fn test_permanent_block_survives_sweep() {
        let ledger = BlockageLedger::new(100);
        let mut state = state();
        ledger.mark_blocked(&mut state, TaskKind::WallConstruction, 10, true);
        ledger.mark_blocked(&mut state, TaskKind::RoadConstruction, 10, false);

        assert_eq!(ledger.sweep(&mut state, 10_000), 1);
        assert!(ledger.is_blocked(&state, TaskKind::WallConstruction, 10_000));

        assert_eq!(ledger.reset(&mut state), 1);
        assert!(!ledger.is_blocked(&state, TaskKind::WallConstruction, 10_000));
    }

    #[test]
    fn test_permanent_not_downgraded() {
        let ledger = BlockageLedger::new(100);
        let mut state = state();
        ledger.mark_blocked(&mut state, TaskKind::WallConstruction, 10, true);
        ledger.mark_blocked(&mut state, TaskKind::WallConstruction, 20, false);

        assert!(state.blockage_ledger[&TaskKind::WallConstruction].permanent);
    }

    #[test]
    fn test_sweep_keeps_active_blocks() {
        let ledger = BlockageLedger::new(100);
        let mut state = state();
        ledger.mark_blocked(&mut state, TaskKind::RoadConstruction, 50, false);

        assert_eq!(ledger.sweep(&mut state, 149), 0);
        assert_eq!(ledger.sweep(&mut state, 150), 1);
    }
}
