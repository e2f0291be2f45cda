//! Per-objective desirability scorers.
//!
//! Every scorer is a total function of the live zone view: when the facts it
//! needs are absent it returns a documented fallback instead of failing.
//! Results are raw; [`PriorityRecord`] clamps them into `[0, 100]`.

use crate::domain::models::{
    EngineConfig, PriorityRecord, PrioritySet, StructureKind, TaskCatalog, TaskKind, UnitCensus,
    UnitType, ZoneView,
};

/// Operating mode of a zone, derived from hostile presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneMode {
    Normal,
    Siege,
}

impl ZoneMode {
    pub fn of(view: &ZoneView, config: &EngineConfig) -> Self {
        if view.hostile_body_parts() >= config.siege_body_parts {
            Self::Siege
        } else {
            Self::Normal
        }
    }
}

/// Scores unit-assignable and defense objectives for one zone.
#[derive(Debug, Clone)]
pub struct PriorityScorer {
    config: EngineConfig,
}

impl Default for PriorityScorer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl PriorityScorer {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Raw score of a unit-assignable objective.
    ///
    /// The expansion objective has its own scorer and yields 0 here, as do
    /// production and unmanaged objectives.
    ///
    /// Construction objectives score only while a matching site exists:
    /// towers and links 100, roads 100, walls and ramparts 1, extensions by
    /// spawn energy fill. Without a site their fallback is 0, so units are
    /// never sent to build nothing.
    pub fn score_task(&self, task: TaskKind, view: &ZoneView) -> f64 {
        let c = &self.config;
        match task {
            TaskKind::EnergyHarvesting => match view.storage {
                None => c.harvest_fallback_score,
                Some(storage) => (1.0 - storage.fill_ratio()) * 100.0,
            },
            TaskKind::EnergyTransferring => c.transfer_score,
            TaskKind::ControllerUpgrading => {
                if view.controller.ticks_to_downgrade < c.downgrade_risk_ticks {
                    c.upgrade_urgent_score
                } else {
                    c.upgrade_score
                }
            }
            TaskKind::TowerConstruction => site_score(view, &[StructureKind::Tower], 100.0),
            TaskKind::LinkConstruction => site_score(view, &[StructureKind::Link], 100.0),
            TaskKind::ExtensionConstruction => site_score(
                view,
                &[StructureKind::Extension],
                view.spawn_energy.fill_ratio() * 100.0,
            ),
            TaskKind::RoadConstruction => site_score(
                view,
                &[StructureKind::Road, StructureKind::Container],
                100.0,
            ),
            TaskKind::WallConstruction => site_score(
                view,
                &[StructureKind::Wall, StructureKind::Rampart],
                1.0,
            ),
            TaskKind::TowerRefueling => {
                let lowest = view
                    .towers
                    .iter()
                    .map(|t| t.fill_ratio())
                    .fold(1.0_f64, f64::min);
                (1.0 - lowest) * 100.0
            }
            TaskKind::StorageConstruction => {
                if view.storage.is_some() {
                    0.0
                } else {
                    100.0
                }
            }
            TaskKind::WallRepairing => {
                let damaged = view
                    .barriers
                    .iter()
                    .any(|b| b.hits < b.hits_max.min(c.desired_wall_hits));
                if damaged {
                    1.0
                } else {
                    0.0
                }
            }
            // Scouts are directed explicitly; receivers are pinned statically.
            TaskKind::Scouting | TaskKind::ReceiverOperation => 0.0,
            TaskKind::InfluenceExpansion
            | TaskKind::CreepDefense
            | TaskKind::BruiserSpawning
            | TaskKind::ClaimerSpawning
            | TaskKind::MarksmanSpawning
            | TaskKind::MedicSpawning
            | TaskKind::ScoutSpawning
            | TaskKind::WorkerSpawning
            | TaskKind::DemolisherSpawning
            | TaskKind::BruiserDefenseSpawning
            | TaskKind::TankSpawning => 0.0,
        }
    }

    /// Score of the defense-production objective.
    ///
    /// Zero under safe mode. Otherwise a fixed score while hostiles are
    /// present and rampart defenders are short, raised (never lowered) by
    /// `external_override`.
    pub fn defense_spawning(
        &self,
        view: &ZoneView,
        census: &UnitCensus,
        external_override: Option<f64>,
    ) -> f64 {
        if view.controller.safe_mode {
            return 0.0;
        }
        let inherent = if self.defender_needed(view, census) {
            self.config.defense_score
        } else {
            0.0
        };
        match external_override {
            Some(value) if value > inherent => value,
            _ => inherent,
        }
    }

    fn defender_needed(&self, view: &ZoneView, census: &UnitCensus) -> bool {
        if !view.has_hostiles() {
            return false;
        }
        let ramparts = i64::from(view.melee_range_ramparts);
        let bruisers = i64::try_from(census.count(UnitType::Bruiser)).unwrap_or(i64::MAX);
        ramparts - bruisers + self.config.defender_bias > 0
    }

    /// Upward-only overrides in force for the zone's current mode.
    pub fn mode_overrides(&self, view: &ZoneView) -> Vec<(TaskKind, f64)> {
        match ZoneMode::of(view, &self.config) {
            ZoneMode::Normal => Vec::new(),
            ZoneMode::Siege => TaskKind::ALL
                .iter()
                .filter(|task| task.is_fortification())
                .map(|&task| (task, self.config.siege_override_score))
                .collect(),
        }
    }

    /// Score every unit-assignable objective of the catalog for one cycle.
    ///
    /// `expansion` is the already-computed expansion record.
    pub fn score_zone(
        &self,
        catalog: &TaskCatalog,
        view: &ZoneView,
        expansion: PriorityRecord,
    ) -> PrioritySet {
        let overrides = self.mode_overrides(view);
        catalog
            .unit_assignable()
            .map(|task| {
                if task == TaskKind::InfluenceExpansion {
                    return expansion;
                }
                let mut score = self.score_task(task, view);
                if let Some(&(_, value)) = overrides.iter().find(|(t, _)| *t == task) {
                    score = score.max(value);
                }
                PriorityRecord::new(task, score)
            })
            .collect()
    }
}

fn site_score(view: &ZoneView, kinds: &[StructureKind], score: f64) -> f64 {
    if view.has_site(kinds) {
        score
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        ConstructionSite, ExpansionKind, HostileView, Position, StoreView, Unit,
    };

    fn view() -> ZoneView {
        ZoneView::new("W1N1", "me")
    }

    fn hostile(body_size: u32) -> HostileView {
        HostileView {
            pos: Position::new("W1N1", 20, 20),
            body_size,
        }
    }

    #[test]
    fn test_harvest_without_storage_falls_back() {
        let scorer = PriorityScorer::default();
        assert_eq!(scorer.score_task(TaskKind::EnergyHarvesting, &view()), 100.0);
    }

    #[test]
    fn test_harvest_scales_with_storage_emptiness() {
        let scorer = PriorityScorer::default();
        let mut v = view();
        v.storage = Some(StoreView::new(750_000, 1_000_000));
        let score = scorer.score_task(TaskKind::EnergyHarvesting, &v);
        assert!((score - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_upgrade_urgent_below_downgrade_threshold() {
        let scorer = PriorityScorer::default();
        let mut v = view();
        v.controller.ticks_to_downgrade = 19_999;
        assert_eq!(scorer.score_task(TaskKind::ControllerUpgrading, &v), 100.0);
        v.controller.ticks_to_downgrade = 20_000;
        assert_eq!(scorer.score_task(TaskKind::ControllerUpgrading, &v), 90.0);
    }

    #[test]
    fn test_tower_refueling_uses_lowest_tower() {
        let scorer = PriorityScorer::default();
        let mut v = view();
        assert_eq!(scorer.score_task(TaskKind::TowerRefueling, &v), 0.0);
        v.towers = vec![StoreView::new(900, 1000), StoreView::new(400, 1000)];
        let score = scorer.score_task(TaskKind::TowerRefueling, &v);
        assert!((score - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_road_requires_site() {
        let scorer = PriorityScorer::default();
        let mut v = view();
        assert_eq!(scorer.score_task(TaskKind::RoadConstruction, &v), 0.0);
        v.construction_sites.push(ConstructionSite {
            kind: StructureKind::Container,
            pos: Position::new("W1N1", 5, 5),
        });
        assert_eq!(scorer.score_task(TaskKind::RoadConstruction, &v), 100.0);
    }

    #[test]
    fn test_construction_fallbacks_without_sites() {
        let scorer = PriorityScorer::default();
        let mut v = view();
        for task in [
            TaskKind::TowerConstruction,
            TaskKind::LinkConstruction,
            TaskKind::WallConstruction,
        ] {
            assert_eq!(scorer.score_task(task, &v), 0.0, "{task}");
        }
        for (kind, task, score) in [
            (StructureKind::Tower, TaskKind::TowerConstruction, 100.0),
            (StructureKind::Link, TaskKind::LinkConstruction, 100.0),
            (StructureKind::Rampart, TaskKind::WallConstruction, 1.0),
        ] {
            v.construction_sites.push(ConstructionSite {
                kind,
                pos: Position::new("W1N1", 6, 6),
            });
            assert_eq!(scorer.score_task(task, &v), score, "{task}");
        }
    }

    #[test]
    fn test_defense_zero_in_safe_mode() {
        let scorer = PriorityScorer::default();
        let mut v = view();
        v.hostiles.push(hostile(10));
        v.controller.safe_mode = true;
        let census = UnitCensus::default();
        assert_eq!(scorer.defense_spawning(&v, &census, Some(99.0)), 0.0);
    }

    #[test]
    fn test_defense_needed_when_defenders_short() {
        let scorer = PriorityScorer::default();
        let mut v = view();
        v.hostiles.push(hostile(10));
        v.melee_range_ramparts = 1;
        let bruisers: Vec<Unit> = (0..3)
            .map(|i| Unit::new(format!("b{i}"), UnitType::Bruiser))
            .collect();

        assert_eq!(scorer.defense_spawning(&v, &UnitCensus::default(), None), 75.0);
        assert_eq!(
            scorer.defense_spawning(&v, &UnitCensus::from_units(&bruisers), None),
            0.0
        );
    }

    #[test]
    fn test_defense_override_only_raises() {
        let scorer = PriorityScorer::default();
        let mut v = view();
        v.hostiles.push(hostile(10));
        let census = UnitCensus::default();
        assert_eq!(scorer.defense_spawning(&v, &census, Some(40.0)), 75.0);
        assert_eq!(scorer.defense_spawning(&v, &census, Some(90.0)), 90.0);
    }

    #[test]
    fn test_siege_raises_fortification() {
        let scorer = PriorityScorer::default();
        let catalog = TaskCatalog::standard().unwrap();
        let mut v = view();
        v.hostiles = vec![hostile(50), hostile(50)];
        v.storage = Some(StoreView::new(0, 1000));

        let set = scorer.score_zone(
            &catalog,
            &v,
            PriorityRecord::expansion(ExpansionKind::Settling, 0.0),
        );

        assert_eq!(set.score(TaskKind::TowerConstruction), Some(50.0));
        assert_eq!(set.score(TaskKind::StorageConstruction), Some(50.0));
        assert_eq!(set.score(TaskKind::RoadConstruction), Some(0.0));
        assert_eq!(set.score(TaskKind::EnergyHarvesting), Some(100.0));
    }

    #[test]
    fn test_score_zone_covers_unit_assignable_only() {
        let scorer = PriorityScorer::default();
        let catalog = TaskCatalog::standard().unwrap();
        let set = scorer.score_zone(
            &catalog,
            &view(),
            PriorityRecord::expansion(ExpansionKind::Settling, 0.0),
        );
        assert_eq!(set.len(), catalog.unit_assignable().count());
        assert!(!set.contains(TaskKind::WorkerSpawning));
        assert!(!set.contains(TaskKind::CreepDefense));
        assert_eq!(set.expansion_kind(), Some(ExpansionKind::Settling));
    }
}
