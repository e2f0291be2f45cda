//! Port trait definitions (Hexagonal Architecture)
//!
//! Contracts for the engine's external collaborators:
//! - ZoneStore: durable per-zone state
//! - PathCost: movement/pathing queries
//! - Manufacturer: unit production
//! - World: per-cycle snapshots and executor feedback

pub mod manufacture;
pub mod pathing;
pub mod world;
pub mod zone_store;

pub use manufacture::{ManufactureReceipt, Manufacturer};
pub use pathing::{PathCost, PathResult};
pub use world::{ExecutorSignal, World};
pub use zone_store::ZoneStore;
