//! Persistent cycle runner.
//!
//! Wraps a [`CycleScheduler`] with a [`ZoneStore`]: zone state is loaded
//! lazily the first time a zone is seen and saved after every cycle. Store
//! failures never abort a run; the affected zone sits out the cycle.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::models::{ZoneId, ZoneState};
use crate::domain::ports::{World, ZoneStore};
use crate::services::cycle::{CycleReport, CycleScheduler};

pub struct CycleRunner {
    /// Tags every log line of this run.
    run_id: Uuid,
    scheduler: CycleScheduler,
    store: Arc<dyn ZoneStore>,
    states: BTreeMap<ZoneId, ZoneState>,
}

impl CycleRunner {
    pub fn new(scheduler: CycleScheduler, store: Arc<dyn ZoneStore>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            scheduler,
            store,
            states: BTreeMap::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn scheduler_mut(&mut self) -> &mut CycleScheduler {
        &mut self.scheduler
    }

    /// In-memory state of a zone seen during this run.
    pub fn state(&self, zone: &ZoneId) -> Option<&ZoneState> {
        self.states.get(zone)
    }

    /// Run the world's current cycle, then advance it.
    pub async fn step<W: World>(&mut self, world: &mut W) -> CycleReport {
        let excluded = self.load_missing(world).await;
        let report = self
            .scheduler
            .run_cycle_excluding(world, &mut self.states, &excluded);
        self.persist(&excluded).await;
        world.advance();
        report
    }

    /// Run `cycles` consecutive cycles.
    #[instrument(skip(self, world), fields(run_id = %self.run_id, start = world.cycle()))]
    pub async fn run<W: World>(&mut self, world: &mut W, cycles: u64) -> Vec<CycleReport> {
        let mut reports = Vec::with_capacity(usize::try_from(cycles).unwrap_or(0));
        for _ in 0..cycles {
            reports.push(self.step(world).await);
        }
        let decisions: usize = reports.iter().map(|r| r.decisions.len()).sum();
        info!(cycles, decisions, zones = self.states.len(), "run complete");
        reports
    }

    /// Load state for zones not cached yet. Returns zones whose load failed.
    async fn load_missing<W: World>(&mut self, world: &W) -> BTreeSet<ZoneId> {
        let mut failed = BTreeSet::new();
        for zone in world.zones() {
            if self.states.contains_key(&zone) {
                continue;
            }
            match self.store.load_or_init(&zone).await {
                Ok(state) => {
                    self.states.insert(zone, state);
                }
                Err(e) => {
                    warn!(zone = %zone, error = %e, "failed to load zone state; skipping zone this cycle");
                    failed.insert(zone);
                }
            }
        }
        failed
    }

    async fn persist(&self, excluded: &BTreeSet<ZoneId>) {
        for (zone, state) in &self.states {
            if excluded.contains(zone) {
                continue;
            }
            if let Err(e) = self.store.save(state).await {
                warn!(zone = %zone, error = %e, "failed to save zone state");
            }
        }
    }
}
