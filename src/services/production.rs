//! Turning production priorities into at most one manufacture request.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::errors::ManufactureError;
use crate::domain::models::{
    max_body, EngineConfig, ProductionPriorities, TaskKind, UnitCensus, UnitType, ZoneView,
};
use crate::domain::ports::{ManufactureReceipt, Manufacturer};

/// Upper bound on workers kept by a zone.
pub fn max_workers(source_count: u32, controller_level: u8) -> usize {
    if source_count >= 2 {
        match controller_level {
            l if l > 5 => 4,
            5 => 5,
            _ => 6,
        }
    } else if controller_level > 4 {
        4
    } else {
        5
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Average compute usage is above the threshold.
    ComputeBudget,
    /// No production objective scored above zero.
    NothingWanted,
    /// The wanted unit type is at its per-zone cap.
    AtCapacity(UnitType),
    FacilityBusy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ProductionOutcome {
    Skipped {
        reason: SkipReason,
    },
    Manufactured {
        task: TaskKind,
        unit_id: String,
        unit_type: UnitType,
        parts: usize,
    },
    Failed {
        task: TaskKind,
        error: String,
    },
}

impl ProductionOutcome {
    fn manufactured(task: TaskKind, receipt: ManufactureReceipt) -> Self {
        Self::Manufactured {
            task,
            unit_id: receipt.unit_id,
            unit_type: receipt.unit_type,
            parts: receipt.parts,
        }
    }

    pub fn is_manufactured(&self) -> bool {
        matches!(self, Self::Manufactured { .. })
    }
}

#[derive(Debug, Clone)]
pub struct ProductionArbiter {
    config: EngineConfig,
}

impl Default for ProductionArbiter {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ProductionArbiter {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Request manufacture of the unit type behind the best production
    /// objective. Manufacture failures are logged, never propagated.
    pub fn execute(
        &self,
        view: &ZoneView,
        census: &UnitCensus,
        production: &ProductionPriorities,
        compute_average: f64,
        manufacturer: &mut dyn Manufacturer,
    ) -> ProductionOutcome {
        if compute_average > self.config.compute_threshold {
            info!(zone = %view.zone, compute_average, "compute budget exhausted; production skipped");
            return ProductionOutcome::Skipped {
                reason: SkipReason::ComputeBudget,
            };
        }

        let Some((task, score)) = production.best().filter(|(_, score)| *score > 0.0) else {
            return ProductionOutcome::Skipped {
                reason: SkipReason::NothingWanted,
            };
        };
        let Some(unit_type) = task.produced_unit() else {
            warn!(zone = %view.zone, task = %task, "no unit type is produced by objective");
            return ProductionOutcome::Skipped {
                reason: SkipReason::NothingWanted,
            };
        };

        if self.at_capacity(view, census, unit_type) {
            debug!(zone = %view.zone, unit_type = %unit_type, "unit cap reached; production skipped");
            return ProductionOutcome::Skipped {
                reason: SkipReason::AtCapacity(unit_type),
            };
        }

        let attempt = match &view.spawn {
            None => Err(ManufactureError::NoProductionFacility(view.zone.to_string())),
            Some(spawn) if spawn.busy => {
                return ProductionOutcome::Skipped {
                    reason: SkipReason::FacilityBusy,
                };
            }
            Some(_) => max_body(unit_type, view.spawn_energy.energy, self.config.max_body_parts)
                .and_then(|body| manufacturer.manufacture(&view.zone, unit_type, body)),
        };

        match attempt {
            Ok(receipt) => {
                info!(
                    zone = %view.zone,
                    task = %task,
                    score,
                    unit = %receipt.unit_id,
                    parts = receipt.parts,
                    "unit manufacture requested"
                );
                ProductionOutcome::manufactured(task, receipt)
            }
            Err(error) => {
                warn!(zone = %view.zone, task = %task, error = %error, "manufacture failed");
                ProductionOutcome::Failed {
                    task,
                    error: error.to_string(),
                }
            }
        }
    }

    fn at_capacity(&self, view: &ZoneView, census: &UnitCensus, unit_type: UnitType) -> bool {
        match unit_type {
            UnitType::Worker => {
                census.count(UnitType::Worker)
                    >= max_workers(view.source_count, view.controller.level)
            }
            UnitType::Claimer => census.count(UnitType::Claimer) >= self.config.claimer_cap,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{BodyPart, Position, SpawnView, StoreView, Unit, ZoneId};

    #[derive(Default)]
    struct RecordingFactory {
        requests: Vec<(UnitType, usize)>,
    }

    impl Manufacturer for RecordingFactory {
        fn manufacture(
            &mut self,
            _: &ZoneId,
            unit_type: UnitType,
            body: Vec<BodyPart>,
        ) -> Result<ManufactureReceipt, ManufactureError> {
            self.requests.push((unit_type, body.len()));
            Ok(ManufactureReceipt {
                unit_id: format!("{unit_type}-{}", self.requests.len()),
                unit_type,
                parts: body.len(),
            })
        }
    }

    fn view() -> ZoneView {
        let mut view = ZoneView::new("W1N1", "me");
        view.spawn = Some(SpawnView {
            name: "Spawn1".into(),
            pos: Position::new("W1N1", 25, 25),
            busy: false,
        });
        view
    }

    fn wanting(task: TaskKind, score: f64) -> ProductionPriorities {
        let mut production = ProductionPriorities::new();
        production.set(TaskKind::BruiserDefenseSpawning, 0.0);
        production.set(task, score);
        production
    }

    #[test]
    fn test_max_workers_table() {
        assert_eq!(max_workers(2, 6), 4);
        assert_eq!(max_workers(2, 5), 5);
        assert_eq!(max_workers(2, 3), 6);
        assert_eq!(max_workers(1, 5), 4);
        assert_eq!(max_workers(1, 4), 5);
    }

    #[test]
    fn test_manufactures_best_objective() {
        let arbiter = ProductionArbiter::default();
        let mut factory = RecordingFactory::default();
        let outcome = arbiter.execute(
            &view(),
            &UnitCensus::default(),
            &wanting(TaskKind::WorkerSpawning, 60.0),
            0.3,
            &mut factory,
        );
        assert!(outcome.is_manufactured());
        assert_eq!(factory.requests, vec![(UnitType::Worker, 3)]);
    }

    #[test]
    fn test_compute_budget_skips() {
        let arbiter = ProductionArbiter::default();
        let mut factory = RecordingFactory::default();
        let outcome = arbiter.execute(
            &view(),
            &UnitCensus::default(),
            &wanting(TaskKind::WorkerSpawning, 60.0),
            0.96,
            &mut factory,
        );
        assert_eq!(
            outcome,
            ProductionOutcome::Skipped {
                reason: SkipReason::ComputeBudget
            }
        );
        assert!(factory.requests.is_empty());
    }

    #[test]
    fn test_zero_scores_request_nothing() {
        let arbiter = ProductionArbiter::default();
        let mut factory = RecordingFactory::default();
        let outcome = arbiter.execute(
            &view(),
            &UnitCensus::default(),
            &wanting(TaskKind::WorkerSpawning, 0.0),
            0.1,
            &mut factory,
        );
        assert_eq!(
            outcome,
            ProductionOutcome::Skipped {
                reason: SkipReason::NothingWanted
            }
        );
    }

    #[test]
    fn test_claimer_cap() {
        let arbiter = ProductionArbiter::default();
        let mut factory = RecordingFactory::default();
        let census = UnitCensus::from_units(&[Unit::new("c", UnitType::Claimer)]);
        let outcome = arbiter.execute(
            &view(),
            &census,
            &wanting(TaskKind::ClaimerSpawning, 80.0),
            0.1,
            &mut factory,
        );
        assert_eq!(
            outcome,
            ProductionOutcome::Skipped {
                reason: SkipReason::AtCapacity(UnitType::Claimer)
            }
        );
    }

    #[test]
    fn test_insufficient_energy_is_caught() {
        let arbiter = ProductionArbiter::default();
        let mut factory = RecordingFactory::default();
        let mut v = view();
        v.spawn_energy = StoreView::new(300, 300);
        let outcome = arbiter.execute(
            &v,
            &UnitCensus::default(),
            &wanting(TaskKind::ClaimerSpawning, 80.0),
            0.1,
            &mut factory,
        );
        assert!(matches!(outcome, ProductionOutcome::Failed { task: TaskKind::ClaimerSpawning, .. }));
        assert!(factory.requests.is_empty());
    }

    #[test]
    fn test_missing_facility_fails() {
        let arbiter = ProductionArbiter::default();
        let mut factory = RecordingFactory::default();
        let mut v = view();
        v.spawn = None;
        let outcome = arbiter.execute(
            &v,
            &UnitCensus::default(),
            &wanting(TaskKind::WorkerSpawning, 10.0),
            0.1,
            &mut factory,
        );
        assert!(matches!(outcome, ProductionOutcome::Failed { .. }));
    }
}
