//! Unit domain model.
//!
//! Units are mobile agents living in a zone. Their task binding is owned by
//! the assignment engine; the world only creates and destroys them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::models::task::TaskKind;
use crate::domain::models::world::Position;

/// Concrete unit types the colony can manufacture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    Bruiser,
    Claimer,
    Marksman,
    Medic,
    Scout,
    Worker,
    Demolisher,
    Tank,
}

impl UnitType {
    pub const ALL: [Self; 8] = [
        Self::Bruiser,
        Self::Claimer,
        Self::Marksman,
        Self::Medic,
        Self::Scout,
        Self::Worker,
        Self::Demolisher,
        Self::Tank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bruiser => "bruiser",
            Self::Claimer => "claimer",
            Self::Marksman => "marksman",
            Self::Medic => "medic",
            Self::Scout => "scout",
            Self::Worker => "worker",
            Self::Demolisher => "demolisher",
            Self::Tank => "tank",
        }
    }

    /// Production objectives that manufacture this type. The first entry is
    /// the one fed by averaged history.
    pub fn production_tasks(&self) -> &'static [TaskKind] {
        match self {
            Self::Bruiser => &[TaskKind::BruiserSpawning, TaskKind::BruiserDefenseSpawning],
            Self::Claimer => &[TaskKind::ClaimerSpawning],
            Self::Marksman => &[TaskKind::MarksmanSpawning],
            Self::Medic => &[TaskKind::MedicSpawning],
            Self::Scout => &[TaskKind::ScoutSpawning],
            Self::Worker => &[TaskKind::WorkerSpawning],
            Self::Demolisher => &[TaskKind::DemolisherSpawning],
            Self::Tank => &[TaskKind::TankSpawning],
        }
    }

    pub fn is_soldier(&self) -> bool {
        matches!(
            self,
            Self::Bruiser | Self::Marksman | Self::Medic | Self::Demolisher | Self::Tank
        )
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current task binding of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "task")]
pub enum TaskBinding {
    #[default]
    Unbound,
    Bound(TaskKind),
    /// Could not progress; waiting to be re-evaluated from history.
    Suspended,
}

impl TaskBinding {
    pub fn task(&self) -> Option<TaskKind> {
        match self {
            Self::Bound(task) => Some(*task),
            _ => None,
        }
    }

    pub fn is_bound_to(&self, task: TaskKind) -> bool {
        self.task() == Some(task)
    }
}

/// Objective-specific working state, cleared whenever a unit is rebound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_target: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair_target: Option<Position>,
}

impl WorkingState {
    pub fn clear(&mut self) {
        self.build_target = None;
        self.repair_target = None;
    }

    pub fn is_empty(&self) -> bool {
        self.build_target.is_none() && self.repair_target.is_none()
    }
}

/// A mobile agent and the engine-owned part of its memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub unit_type: UnitType,
    /// Body part count; smaller bodies are preferred for the pinned upgrader.
    #[serde(default = "default_body_size")]
    pub body_size: u32,
    #[serde(default)]
    pub binding: TaskBinding,
    #[serde(default)]
    pub previous_task: Option<TaskKind>,
    /// Held by a pinned role until it expires.
    #[serde(default)]
    pub pinned: bool,
    /// Idle signals are ignored for this unit.
    #[serde(default)]
    pub no_idling: bool,
    /// Travelling to or from a remote operation; not eligible for assignment.
    #[serde(default)]
    pub returning_from_remote: bool,
    #[serde(default)]
    pub working: WorkingState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_link: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scouting_target: Option<Position>,
}

const fn default_body_size() -> u32 {
    3
}

impl Unit {
    pub fn new(id: impl Into<String>, unit_type: UnitType) -> Self {
        Self {
            id: id.into(),
            unit_type,
            body_size: default_body_size(),
            binding: TaskBinding::Unbound,
            previous_task: None,
            pinned: false,
            no_idling: false,
            returning_from_remote: false,
            working: WorkingState::default(),
            source_link: None,
            scouting_target: None,
        }
    }

    pub fn with_binding(mut self, binding: TaskBinding) -> Self {
        self.binding = binding;
        self
    }

    pub fn with_body_size(mut self, body_size: u32) -> Self {
        self.body_size = body_size;
        self
    }

    pub fn current_task(&self) -> Option<TaskKind> {
        self.binding.task()
    }

    /// Bind to `task`, dropping working state from the previous objective.
    pub fn rebind(&mut self, task: TaskKind) {
        self.working.clear();
        self.binding = TaskBinding::Bound(task);
    }

    /// Mark the unit as unable to progress on its current objective.
    pub fn suspend(&mut self) {
        if let Some(task) = self.binding.task() {
            self.previous_task = Some(task);
        }
        self.binding = TaskBinding::Suspended;
    }
}

/// Per-type head count of the units present in a zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitCensus {
    counts: [usize; UnitType::ALL.len()],
}

impl UnitCensus {
    pub fn from_units<'a>(units: impl IntoIterator<Item = &'a Unit>) -> Self {
        let mut census = Self::default();
        for unit in units {
            census.counts[unit.unit_type as usize] += 1;
        }
        census
    }

    pub fn count(&self, unit_type: UnitType) -> usize {
        self.counts[unit_type as usize]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebind_clears_working_state() {
        let mut unit = Unit::new("w1", UnitType::Worker).with_binding(TaskBinding::Bound(
            TaskKind::RoadConstruction,
        ));
        unit.working.build_target = Some(Position::new("W1N1", 10, 10));

        unit.rebind(TaskKind::ControllerUpgrading);

        assert!(unit.working.is_empty());
        assert_eq!(unit.current_task(), Some(TaskKind::ControllerUpgrading));
    }

    #[test]
    fn test_suspend_remembers_previous_task() {
        let mut unit = Unit::new("w1", UnitType::Worker)
            .with_binding(TaskBinding::Bound(TaskKind::TowerRefueling));

        unit.suspend();

        assert_eq!(unit.binding, TaskBinding::Suspended);
        assert_eq!(unit.previous_task, Some(TaskKind::TowerRefueling));
    }

    #[test]
    fn test_census_counts_by_type() {
        let units = vec![
            Unit::new("a", UnitType::Medic),
            Unit::new("b", UnitType::Medic),
            Unit::new("c", UnitType::Tank),
        ];
        let census = UnitCensus::from_units(&units);
        assert_eq!(census.count(UnitType::Medic), 2);
        assert_eq!(census.count(UnitType::Tank), 1);
        assert_eq!(census.count(UnitType::Worker), 0);
        assert_eq!(census.total(), 3);
    }

    #[test]
    fn test_binding_serializes_tagged() {
        let json = serde_json::to_string(&TaskBinding::Bound(TaskKind::Scouting)).unwrap();
        assert_eq!(json, r#"{"state":"bound","task":"scouting"}"#);
        let back: TaskBinding = serde_json::from_str(r#"{"state":"suspended"}"#).unwrap();
        assert_eq!(back, TaskBinding::Suspended);
    }
}
