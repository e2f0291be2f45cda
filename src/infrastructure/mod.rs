//! Infrastructure layer module
//!
//! Configuration loading and logging setup. Persistence and the simulated
//! world live under `adapters`.

pub mod config;
pub mod logging;
