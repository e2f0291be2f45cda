//! Adapters for the engine's collaborators.

pub mod memory;
pub mod scenario;
pub mod sqlite;
