//! Scenario-driven simulated world.
//!
//! A scenario is a YAML document describing the initial zones, units and
//! expansion flags, plus a script of executor signals and compute usage.
//! The world does not simulate unit behavior; bindings are only stored and
//! reported back.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult, ManufactureError};
use crate::domain::models::{
    body_cost, BodyPart, Position, Unit, UnitType, ZoneId, ZoneSnapshot,
};
use crate::domain::ports::{
    ExecutorSignal, ManufactureReceipt, Manufacturer, PathCost, PathResult, World,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Idle,
    Unsafe,
    Stalled,
}

/// Executor feedback delivered at a fixed cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedSignal {
    pub cycle: u64,
    pub zone: ZoneId,
    pub signal: SignalKind,
    pub unit: String,
}

impl ScriptedSignal {
    fn to_signal(&self) -> ExecutorSignal {
        let unit = self.unit.clone();
        match self.signal {
            SignalKind::Idle => ExecutorSignal::Idle(unit),
            SignalKind::Unsafe => ExecutorSignal::Unsafe(unit),
            SignalKind::Stalled => ExecutorSignal::Stalled(unit),
        }
    }
}

/// Compute usage from `from_cycle` onwards, until the next entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComputePhase {
    pub from_cycle: u64,
    pub usage: f64,
}

fn default_regen() -> u64 {
    10
}

fn default_spawn_ticks() -> u64 {
    3
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_cycle: u64,
    pub zones: Vec<ZoneSnapshot>,
    /// Positions no path can reach.
    #[serde(default)]
    pub unreachable: Vec<Position>,
    #[serde(default)]
    pub signals: Vec<ScriptedSignal>,
    #[serde(default)]
    pub compute: Vec<ComputePhase>,
    /// Spawn energy regained per cycle.
    #[serde(default = "default_regen")]
    pub energy_regen: u64,
    /// Cycles a spawn is busy per body part manufactured.
    #[serde(default = "default_spawn_ticks")]
    pub spawn_ticks_per_part: u64,
}

impl Scenario {
    pub fn from_yaml(source: &str) -> DomainResult<Self> {
        let scenario: Self = serde_yaml::from_str(source)?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> DomainResult<()> {
        let mut zones = BTreeSet::new();
        let mut units = BTreeSet::new();
        for snapshot in &self.zones {
            if !zones.insert(&snapshot.view.zone) {
                return Err(DomainError::ScenarioError(format!(
                    "zone {} listed twice",
                    snapshot.view.zone
                )));
            }
            for unit in &snapshot.units {
                if !units.insert(&unit.id) {
                    return Err(DomainError::ScenarioError(format!(
                        "unit id {} used twice",
                        unit.id
                    )));
                }
            }
        }
        if let Some(signal) = self.signals.iter().find(|s| !zones.contains(&s.zone)) {
            return Err(DomainError::ScenarioError(format!(
                "signal for unknown zone {}",
                signal.zone
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct PendingUnit {
    zone: ZoneId,
    ready_at: u64,
    unit: Unit,
}

#[derive(Debug, Clone)]
pub struct ScenarioWorld {
    cycle: u64,
    order: Vec<ZoneId>,
    zones: BTreeMap<ZoneId, ZoneSnapshot>,
    unreachable: BTreeSet<Position>,
    signals: Vec<ScriptedSignal>,
    compute: Vec<ComputePhase>,
    energy_regen: u64,
    spawn_ticks_per_part: u64,
    pending: Vec<PendingUnit>,
    manufactured: u64,
}

impl ScenarioWorld {
    pub fn new(scenario: Scenario) -> Self {
        let order = scenario.zones.iter().map(|s| s.view.zone.clone()).collect();
        let zones = scenario
            .zones
            .into_iter()
            .map(|s| (s.view.zone.clone(), s))
            .collect();
        let mut compute = scenario.compute;
        compute.sort_by_key(|phase| phase.from_cycle);
        Self {
            cycle: scenario.start_cycle,
            order,
            zones,
            unreachable: scenario.unreachable.into_iter().collect(),
            signals: scenario.signals,
            compute,
            energy_regen: scenario.energy_regen,
            spawn_ticks_per_part: scenario.spawn_ticks_per_part,
            pending: Vec::new(),
            manufactured: 0,
        }
    }

    pub fn from_yaml(source: &str) -> DomainResult<Self> {
        Scenario::from_yaml(source).map(Self::new)
    }

    pub fn load(path: &Path) -> DomainResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            DomainError::ScenarioError(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&source)
    }

    pub fn units(&self, zone: &ZoneId) -> &[Unit] {
        self.zones.get(zone).map_or(&[], |s| s.units.as_slice())
    }

    /// Units ordered but not yet finished.
    pub fn pending_units(&self) -> usize {
        self.pending.len()
    }

    fn release_finished(&mut self) {
        let cycle = self.cycle;
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.ready_at <= cycle);
        self.pending = waiting;

        for finished in ready {
            if let Some(snapshot) = self.zones.get_mut(&finished.zone) {
                debug!(zone = %finished.zone, unit = %finished.unit.id, "unit finished");
                snapshot.units.push(finished.unit);
            }
        }
        let busy: BTreeSet<ZoneId> = self.pending.iter().map(|p| p.zone.clone()).collect();
        for (zone, snapshot) in &mut self.zones {
            if let Some(spawn) = &mut snapshot.view.spawn {
                spawn.busy = busy.contains(zone);
            }
        }
    }
}

impl PathCost for ScenarioWorld {
    fn path_cost(&self, origin: &Position, targets: &[Position], range: u32, _safe: bool) -> PathResult {
        targets
            .iter()
            .filter(|t| !self.unreachable.contains(*t))
            .map(|t| {
                let distance = origin.range_to(t);
                if distance == u32::MAX {
                    // Cross-zone: count a full zone width per hop.
                    50
                } else {
                    distance.saturating_sub(range)
                }
            })
            .min()
            .map_or_else(PathResult::unreachable, |cost| PathResult::reachable(f64::from(cost)))
    }
}

impl Manufacturer for ScenarioWorld {
    fn manufacture(
        &mut self,
        zone: &ZoneId,
        unit_type: UnitType,
        body: Vec<BodyPart>,
    ) -> Result<ManufactureReceipt, ManufactureError> {
        let snapshot = self
            .zones
            .get_mut(zone)
            .ok_or_else(|| ManufactureError::NoProductionFacility(zone.to_string()))?;
        let view = &mut snapshot.view;
        let spawn = view
            .spawn
            .as_mut()
            .ok_or_else(|| ManufactureError::NoProductionFacility(zone.to_string()))?;
        if spawn.busy {
            return Err(ManufactureError::FacilityBusy(zone.to_string()));
        }
        let cost = body_cost(&body);
        if u64::from(cost) > view.spawn_energy.energy {
            return Err(ManufactureError::InsufficientResources {
                unit_type,
                needed: cost,
                available: view.spawn_energy.energy,
            });
        }

        view.spawn_energy.energy -= u64::from(cost);
        spawn.busy = true;
        self.manufactured += 1;
        let unit_id = format!("{}-{}-{}", spawn.name, unit_type, self.manufactured);
        let parts = body.len();
        let unit = Unit::new(unit_id.clone(), unit_type).with_body_size(u32::try_from(parts).unwrap_or(u32::MAX));
        let ticks = self.spawn_ticks_per_part * parts as u64;
        self.pending.push(PendingUnit {
            zone: zone.clone(),
            ready_at: self.cycle + ticks.max(1),
            unit,
        });

        Ok(ManufactureReceipt {
            unit_id,
            unit_type,
            parts,
        })
    }
}

impl World for ScenarioWorld {
    fn cycle(&self) -> u64 {
        self.cycle
    }

    fn zones(&self) -> Vec<ZoneId> {
        self.order.clone()
    }

    fn snapshot(&self, zone: &ZoneId) -> Option<ZoneSnapshot> {
        self.zones.get(zone).cloned()
    }

    fn commit_units(&mut self, zone: &ZoneId, units: Vec<Unit>) {
        if let Some(snapshot) = self.zones.get_mut(zone) {
            snapshot.units = units;
        }
    }

    fn drain_signals(&mut self, zone: &ZoneId) -> Vec<ExecutorSignal> {
        let cycle = self.cycle;
        let (due, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.signals)
            .into_iter()
            .partition(|s| s.zone == *zone && s.cycle <= cycle);
        self.signals = rest;
        due.iter().map(ScriptedSignal::to_signal).collect()
    }

    fn compute_usage(&self) -> Option<f64> {
        self.compute
            .iter()
            .rev()
            .find(|phase| phase.from_cycle <= self.cycle)
            .map(|phase| phase.usage)
    }

    fn advance(&mut self) {
        self.cycle += 1;
        for snapshot in self.zones.values_mut() {
            let energy = &mut snapshot.view.spawn_energy;
            energy.energy = (energy.energy + self.energy_regen).min(energy.capacity);
        }
        self.release_finished();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
name: smoke
start_cycle: 10
zones:
  - view:
      zone: W1N1
      owner: me
      spawn: { name: Spawn1, pos: { zone: W1N1, x: 25, y: 25 } }
      spawn_energy: { energy: 300, capacity: 300 }
    units:
      - { id: w1, unit_type: worker }
unreachable:
  - { zone: W1N1, x: 1, y: 1 }
signals:
  - { cycle: 11, zone: W1N1, signal: idle, unit: w1 }
compute:
  - { from_cycle: 0, usage: 0.4 }
  - { from_cycle: 12, usage: 0.99 }
"#;

    fn world() -> ScenarioWorld {
        ScenarioWorld::from_yaml(SCENARIO).unwrap()
    }

    #[test]
    fn test_parses_scenario() {
        let world = world();
        assert_eq!(world.cycle(), 10);
        assert_eq!(world.zones(), vec![ZoneId::new("W1N1")]);
        assert_eq!(world.units(&ZoneId::new("W1N1")).len(), 1);
    }

    #[test]
    fn test_duplicate_unit_rejected() {
        let source = SCENARIO.replace("- { id: w1, unit_type: worker }", "- { id: w1, unit_type: worker }\n      - { id: w1, unit_type: scout }");
        assert!(matches!(ScenarioWorld::from_yaml(&source), Err(DomainError::ScenarioError(_))));
    }

    #[test]
    fn test_signals_delivered_when_due() {
        let mut world = world();
        let zone = ZoneId::new("W1N1");
        assert!(world.drain_signals(&zone).is_empty());
        world.advance();
        assert_eq!(world.drain_signals(&zone), vec![ExecutorSignal::Idle("w1".into())]);
        assert!(world.drain_signals(&zone).is_empty());
    }

    #[test]
    fn test_compute_phases() {
        let mut world = world();
        assert_eq!(world.compute_usage(), Some(0.4));
        world.advance();
        world.advance();
        assert_eq!(world.compute_usage(), Some(0.99));
    }

    #[test]
    fn test_unreachable_targets() {
        let world = world();
        let origin = Position::new("W1N1", 10, 10);
        assert!(!world.path_cost(&origin, &[Position::new("W1N1", 1, 1)], 1, true).reachable);
        let open = world.path_cost(&origin, &[Position::new("W1N1", 15, 10)], 1, true);
        assert!(open.reachable);
        assert_eq!(open.cost, 4.0);
    }

    #[test]
    fn test_manufacture_occupies_spawn_until_done() {
        let mut world = world();
        let zone = ZoneId::new("W1N1");
        let body = vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move];

        let receipt = world.manufacture(&zone, UnitType::Worker, body.clone()).unwrap();
        assert_eq!(receipt.parts, 3);
        assert!(matches!(
            world.manufacture(&zone, UnitType::Worker, body),
            Err(ManufactureError::FacilityBusy(_))
        ));

        for _ in 0..9 {
            world.advance();
        }
        assert_eq!(world.units(&zone).len(), 2);
        assert_eq!(world.pending_units(), 0);
    }
}
