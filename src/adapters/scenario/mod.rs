//! Scripted simulation world loaded from YAML.

pub mod world;

pub use world::{ComputePhase, Scenario, ScenarioWorld, ScriptedSignal, SignalKind};
