//! Overlord - colony task prioritization and assignment engine
//!
//! Each cycle the engine scores the objectives competing for a zone's
//! attention, smooths those scores over a short history, binds units to
//! objectives with hysteresis, and decides what unit to manufacture next.
//! Failing objectives are blocked for a while so they cannot stall the
//! colony.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, port traits and errors
//! - **Service Layer** (`services`): scoring, assignment, production and
//!   their scheduling
//! - **Adapters** (`adapters`): zone stores and the scenario world
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use overlord::adapters::memory::InMemoryZoneStore;
//! use overlord::adapters::scenario::ScenarioWorld;
//! use overlord::services::{CycleRunner, CycleScheduler};
//! use overlord::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut world = ScenarioWorld::load("demos/two_zones.yaml".as_ref())?;
//!     let scheduler = CycleScheduler::new(&Config::default())?;
//!     let mut runner = CycleRunner::new(scheduler, Arc::new(InMemoryZoneStore::new()));
//!     let reports = runner.run(&mut world, 50).await;
//!     println!("{} cycles", reports.len());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::models::{
    Config, EngineConfig, LoggingConfig, PrioritySet, ScheduleConfig, TaskCatalog, TaskKind, Unit,
    UnitType, ZoneId, ZoneState,
};
pub use domain::ports::{Manufacturer, PathCost, World, ZoneStore};
pub use domain::{CatalogError, DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{CycleRunner, CycleScheduler, DecisionPass};
