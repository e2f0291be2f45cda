//! Read-only world snapshots.
//!
//! A [`ZoneView`] is built fresh by the world collaborator every cycle and
//! must not be retained into the next one.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::domain::models::unit::Unit;

/// Identifier of an independently managed zone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub String);

impl ZoneId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Grid position inside a zone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub zone: ZoneId,
    pub x: u8,
    pub y: u8,
}

impl Position {
    pub fn new(zone: impl Into<String>, x: u8, y: u8) -> Self {
        Self {
            zone: ZoneId::new(zone),
            x,
            y,
        }
    }

    /// Chebyshev distance; `u32::MAX` across zones.
    pub fn range_to(&self, other: &Self) -> u32 {
        if self.zone != other.zone {
            return u32::MAX;
        }
        let dx = u32::from(self.x.abs_diff(other.x));
        let dy = u32::from(self.y.abs_diff(other.y));
        dx.max(dy)
    }

    pub fn in_range(&self, other: &Self, range: u32) -> bool {
        self.range_to(other) <= range
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{},{}", self.zone, self.x, self.y)
    }
}

/// Energy container (storage, tower, spawn pool).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoreView {
    pub energy: u64,
    pub capacity: u64,
}

impl StoreView {
    pub fn new(energy: u64, capacity: u64) -> Self {
        Self { energy, capacity }
    }

    /// Fill ratio in `[0, 1]`; an empty-capacity container counts as full.
    pub fn fill_ratio(&self) -> f64 {
        if self.capacity == 0 {
            return 1.0;
        }
        (self.energy as f64 / self.capacity as f64).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerView {
    pub level: u8,
    pub ticks_to_downgrade: u32,
    #[serde(default)]
    pub safe_mode: bool,
    #[serde(default)]
    pub owner: Option<String>,
}

impl Default for ControllerView {
    fn default() -> Self {
        Self {
            level: 1,
            ticks_to_downgrade: 20_000,
            safe_mode: false,
            owner: None,
        }
    }
}

/// Structure kinds relevant to construction scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    Tower,
    Extension,
    Road,
    Container,
    Wall,
    Rampart,
    Storage,
    Link,
    Spawn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionSite {
    pub kind: StructureKind,
    pub pos: Position,
}

/// Wall or rampart with its durability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarrierView {
    pub kind: StructureKind,
    pub pos: Position,
    pub hits: u64,
    pub hits_max: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MineralDensity {
    Low,
    Moderate,
    High,
    Ultra,
}

impl MineralDensity {
    /// Density rating in `(0, 0.8]`.
    pub fn rating(&self) -> f64 {
        let rank = match self {
            Self::Low => 1.0,
            Self::Moderate => 2.0,
            Self::High => 3.0,
            Self::Ultra => 4.0,
        };
        rank / 5.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MineralView {
    pub mineral: String,
    pub density: MineralDensity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostileView {
    pub pos: Position,
    pub body_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnView {
    pub name: String,
    pub pos: Position,
    #[serde(default)]
    pub busy: bool,
}

/// Everything the engine may read about one owned zone during one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneView {
    pub zone: ZoneId,
    /// Faction name of the colony owning this zone.
    pub owner: String,
    #[serde(default)]
    pub controller: ControllerView,
    #[serde(default)]
    pub spawn: Option<SpawnView>,
    #[serde(default)]
    pub storage: Option<StoreView>,
    #[serde(default = "default_spawn_energy")]
    pub spawn_energy: StoreView,
    #[serde(default)]
    pub towers: Vec<StoreView>,
    #[serde(default)]
    pub source_count: u32,
    #[serde(default)]
    pub construction_sites: Vec<ConstructionSite>,
    #[serde(default)]
    pub barriers: Vec<BarrierView>,
    #[serde(default)]
    pub hostiles: Vec<HostileView>,
    /// Own ramparts within melee range of at least one hostile.
    #[serde(default)]
    pub melee_range_ramparts: u32,
    #[serde(default)]
    pub receiver_links: Vec<Position>,
    #[serde(default)]
    pub placed_controller_link: bool,
    #[serde(default)]
    pub controller_pos: Option<Position>,
}

fn default_spawn_energy() -> StoreView {
    StoreView::new(300, 300)
}

impl ZoneView {
    pub fn new(zone: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            zone: ZoneId::new(zone),
            owner: owner.into(),
            controller: ControllerView::default(),
            spawn: None,
            storage: None,
            spawn_energy: default_spawn_energy(),
            towers: Vec::new(),
            source_count: 1,
            construction_sites: Vec::new(),
            barriers: Vec::new(),
            hostiles: Vec::new(),
            melee_range_ramparts: 0,
            receiver_links: Vec::new(),
            placed_controller_link: false,
            controller_pos: None,
        }
    }

    pub fn has_hostiles(&self) -> bool {
        !self.hostiles.is_empty()
    }

    pub fn hostile_body_parts(&self) -> u32 {
        self.hostiles.iter().map(|h| h.body_size).sum()
    }

    pub fn has_site(&self, kinds: &[StructureKind]) -> bool {
        self.construction_sites
            .iter()
            .any(|site| kinds.contains(&site.kind))
    }

    pub fn storage_energy(&self) -> Option<u64> {
        self.storage.map(|s| s.energy)
    }
}

/// Observation of a foreign zone targeted for expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetZoneView {
    pub zone: ZoneId,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub safe_mode: bool,
    #[serde(default)]
    pub source_count: u32,
    #[serde(default)]
    pub minerals: Vec<MineralView>,
    #[serde(default)]
    pub hostile_spawns: Vec<Position>,
    #[serde(default)]
    pub hostile_towers: Vec<StoreView>,
    #[serde(default)]
    pub hostiles: Vec<HostileView>,
    /// Suitable for remote operation and claimed; workers may help settle.
    #[serde(default)]
    pub ready_for_settling: bool,
}

/// The flag directing a zone's expansion and what is currently seen there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionTarget {
    pub flag: Position,
    /// `None` when the target zone is not observed this cycle.
    #[serde(default)]
    pub observed: Option<TargetZoneView>,
}

/// One zone's slice of the world for a single cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    pub view: ZoneView,
    /// Flags naming this zone as their occupying force. Only the first is
    /// pursued.
    #[serde(default)]
    pub expansions: Vec<ExpansionTarget>,
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl ZoneSnapshot {
    pub fn new(view: ZoneView) -> Self {
        Self {
            view,
            expansions: Vec::new(),
            units: Vec::new(),
        }
    }

    /// The expansion target this zone pursues.
    pub fn expansion_target(&self) -> Option<&ExpansionTarget> {
        if self.expansions.len() > 1 {
            warn!(
                zone = %self.view.zone,
                flags = self.expansions.len(),
                "zone is the occupying force of multiple expansion flags; using the first"
            );
        }
        self.expansions.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_is_chebyshev() {
        let a = Position::new("W1N1", 10, 10);
        let b = Position::new("W1N1", 13, 11);
        assert_eq!(a.range_to(&b), 3);
        assert!(a.in_range(&b, 3));
        assert!(!a.in_range(&b, 2));
    }

    #[test]
    fn test_range_across_zones_is_unbounded() {
        let a = Position::new("W1N1", 10, 10);
        let b = Position::new("W2N1", 10, 10);
        assert_eq!(a.range_to(&b), u32::MAX);
    }

    #[test]
    fn test_fill_ratio() {
        assert!((StoreView::new(250, 1000).fill_ratio() - 0.25).abs() < f64::EPSILON);
        assert!((StoreView::new(0, 0).fill_ratio() - 1.0).abs() < f64::EPSILON);
        assert!((StoreView::new(2000, 1000).fill_ratio() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_density_rating() {
        assert!((MineralDensity::Low.rating() - 0.2).abs() < f64::EPSILON);
        assert!((MineralDensity::Ultra.rating() - 0.8).abs() < f64::EPSILON);
    }
}
