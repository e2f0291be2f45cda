//! Task domain model.
//!
//! Tasks are the objectives a zone competes over each cycle. The catalog is
//! closed: every objective is a [`TaskKind`] variant with a stable numeric id,
//! so dispatch tables are plain `match` expressions checked for exhaustiveness.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::domain::errors::CatalogError;
use crate::domain::models::unit::UnitType;

/// Kind of unit an objective can be handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Claim,
    Scout,
    Soldier,
    Worker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claim => "claim",
            Self::Scout => "scout",
            Self::Soldier => "soldier",
            Self::Worker => "worker",
        }
    }

    /// Unit types able to pursue objectives of this role, in preference order.
    pub fn unit_types(&self) -> &'static [UnitType] {
        match self {
            Self::Claim => &[UnitType::Claimer],
            Self::Scout => &[UnitType::Scout],
            Self::Soldier => &[
                UnitType::Bruiser,
                UnitType::Marksman,
                UnitType::Medic,
                UnitType::Demolisher,
                UnitType::Tank,
            ],
            Self::Worker => &[UnitType::Worker],
        }
    }

    pub fn accepts(&self, unit_type: UnitType) -> bool {
        self.unit_types().contains(&unit_type)
    }
}

/// How an objective is resolved by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    /// Resolved into a request to manufacture a new unit.
    Production,
    /// A unit of the given role can be bound to it directly.
    UnitAssignable(Role),
    /// Never chosen by the engine; may preempt it externally.
    Unmanaged,
}

/// Every objective known to the engine, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    EnergyHarvesting,
    ControllerUpgrading,
    BruiserSpawning,
    TowerConstruction,
    ExtensionConstruction,
    InfluenceExpansion,
    RoadConstruction,
    WallConstruction,
    TowerRefueling,
    ClaimerSpawning,
    MarksmanSpawning,
    MedicSpawning,
    ScoutSpawning,
    WorkerSpawning,
    DemolisherSpawning,
    Scouting,
    StorageConstruction,
    EnergyTransferring,
    WallRepairing,
    CreepDefense,
    BruiserDefenseSpawning,
    LinkConstruction,
    ReceiverOperation,
    TankSpawning,
}

impl TaskKind {
    /// All objectives in catalog order.
    pub const ALL: [Self; 24] = [
        Self::EnergyHarvesting,
        Self::ControllerUpgrading,
        Self::BruiserSpawning,
        Self::TowerConstruction,
        Self::ExtensionConstruction,
        Self::InfluenceExpansion,
        Self::RoadConstruction,
        Self::WallConstruction,
        Self::TowerRefueling,
        Self::ClaimerSpawning,
        Self::MarksmanSpawning,
        Self::MedicSpawning,
        Self::ScoutSpawning,
        Self::WorkerSpawning,
        Self::DemolisherSpawning,
        Self::Scouting,
        Self::StorageConstruction,
        Self::EnergyTransferring,
        Self::WallRepairing,
        Self::CreepDefense,
        Self::BruiserDefenseSpawning,
        Self::LinkConstruction,
        Self::ReceiverOperation,
        Self::TankSpawning,
    ];

    /// Stable numeric identifier. Persisted; never renumber.
    pub const fn id(self) -> u16 {
        match self {
            Self::EnergyHarvesting => 0,
            Self::ControllerUpgrading => 1,
            Self::BruiserSpawning => 2,
            Self::TowerConstruction => 3,
            Self::ExtensionConstruction => 4,
            Self::InfluenceExpansion => 5,
            Self::RoadConstruction => 6,
            Self::WallConstruction => 7,
            Self::TowerRefueling => 8,
            Self::ClaimerSpawning => 9,
            Self::MarksmanSpawning => 10,
            Self::MedicSpawning => 11,
            Self::ScoutSpawning => 12,
            Self::WorkerSpawning => 13,
            Self::DemolisherSpawning => 14,
            Self::Scouting => 15,
            Self::StorageConstruction => 16,
            Self::EnergyTransferring => 17,
            Self::WallRepairing => 18,
            Self::CreepDefense => 19,
            Self::BruiserDefenseSpawning => 20,
            Self::LinkConstruction => 21,
            Self::ReceiverOperation => 22,
            Self::TankSpawning => 23,
        }
    }

    pub const fn category(self) -> TaskCategory {
        match self {
            Self::EnergyHarvesting
            | Self::ControllerUpgrading
            | Self::TowerConstruction
            | Self::ExtensionConstruction
            | Self::RoadConstruction
            | Self::WallConstruction
            | Self::TowerRefueling
            | Self::StorageConstruction
            | Self::EnergyTransferring
            | Self::WallRepairing
            | Self::LinkConstruction
            | Self::ReceiverOperation => TaskCategory::UnitAssignable(Role::Worker),
            Self::InfluenceExpansion => TaskCategory::UnitAssignable(Role::Soldier),
            Self::Scouting => TaskCategory::UnitAssignable(Role::Scout),
            Self::BruiserSpawning
            | Self::ClaimerSpawning
            | Self::MarksmanSpawning
            | Self::MedicSpawning
            | Self::ScoutSpawning
            | Self::WorkerSpawning
            | Self::DemolisherSpawning
            | Self::BruiserDefenseSpawning
            | Self::TankSpawning => TaskCategory::Production,
            Self::CreepDefense => TaskCategory::Unmanaged,
        }
    }

    pub fn role(self) -> Option<Role> {
        match self.category() {
            TaskCategory::UnitAssignable(role) => Some(role),
            _ => None,
        }
    }

    pub fn is_unit_assignable(self) -> bool {
        matches!(self.category(), TaskCategory::UnitAssignable(_))
    }

    pub fn is_production(self) -> bool {
        matches!(self.category(), TaskCategory::Production)
    }

    /// Unit type a production objective manufactures.
    pub const fn produced_unit(self) -> Option<UnitType> {
        match self {
            Self::BruiserSpawning | Self::BruiserDefenseSpawning => Some(UnitType::Bruiser),
            Self::ClaimerSpawning => Some(UnitType::Claimer),
            Self::MarksmanSpawning => Some(UnitType::Marksman),
            Self::MedicSpawning => Some(UnitType::Medic),
            Self::ScoutSpawning => Some(UnitType::Scout),
            Self::WorkerSpawning => Some(UnitType::Worker),
            Self::DemolisherSpawning => Some(UnitType::Demolisher),
            Self::TankSpawning => Some(UnitType::Tank),
            _ => None,
        }
    }

    /// Construction objectives that receive the siege override.
    pub fn is_fortification(self) -> bool {
        matches!(
            self,
            Self::TowerConstruction
                | Self::ExtensionConstruction
                | Self::WallConstruction
                | Self::StorageConstruction
                | Self::LinkConstruction
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnergyHarvesting => "energy_harvesting",
            Self::ControllerUpgrading => "controller_upgrading",
            Self::BruiserSpawning => "bruiser_spawning",
            Self::TowerConstruction => "tower_construction",
            Self::ExtensionConstruction => "extension_construction",
            Self::InfluenceExpansion => "influence_expansion",
            Self::RoadConstruction => "road_construction",
            Self::WallConstruction => "wall_construction",
            Self::TowerRefueling => "tower_refueling",
            Self::ClaimerSpawning => "claimer_spawning",
            Self::MarksmanSpawning => "marksman_spawning",
            Self::MedicSpawning => "medic_spawning",
            Self::ScoutSpawning => "scout_spawning",
            Self::WorkerSpawning => "worker_spawning",
            Self::DemolisherSpawning => "demolisher_spawning",
            Self::Scouting => "scouting",
            Self::StorageConstruction => "storage_construction",
            Self::EnergyTransferring => "energy_transferring",
            Self::WallRepairing => "wall_repairing",
            Self::CreepDefense => "creep_defense",
            Self::BruiserDefenseSpawning => "bruiser_defense_spawning",
            Self::LinkConstruction => "link_construction",
            Self::ReceiverOperation => "receiver_operation",
            Self::TankSpawning => "tank_spawning",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog entry: identifier plus category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: u16,
    pub kind: TaskKind,
    pub category: TaskCategory,
}

impl From<TaskKind> for TaskDefinition {
    fn from(kind: TaskKind) -> Self {
        Self {
            id: kind.id(),
            kind,
            category: kind.category(),
        }
    }
}

/// Process-wide registry of objective definitions.
#[derive(Debug, Clone)]
pub struct TaskCatalog {
    entries: Vec<TaskDefinition>,
}

impl TaskCatalog {
    /// The built-in catalog, validated.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::from_entries(TaskKind::ALL.iter().copied().map(TaskDefinition::from).collect())
    }

    /// Build a catalog from explicit entries, rejecting duplicate ids.
    pub fn from_entries(entries: Vec<TaskDefinition>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.id) {
                return Err(CatalogError::DuplicateTaskId(entry.id));
            }
        }
        Ok(Self { entries })
    }

    /// Exactly one entry must match, otherwise the lookup fails.
    pub fn get_by_id(&self, id: u16) -> Result<&TaskDefinition, CatalogError> {
        let mut matches = self.entries.iter().filter(|entry| entry.id == id);
        match (matches.next(), matches.next()) {
            (Some(entry), None) => Ok(entry),
            (Some(_), Some(_)) => Err(CatalogError::DuplicateTaskId(id)),
            (None, _) => Err(CatalogError::UnknownTaskId(id)),
        }
    }

    pub fn entries(&self) -> &[TaskDefinition] {
        &self.entries
    }

    /// Unit-assignable objectives in catalog order.
    pub fn unit_assignable(&self) -> impl Iterator<Item = TaskKind> + '_ {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.category, TaskCategory::UnitAssignable(_)))
            .map(|entry| entry.kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
