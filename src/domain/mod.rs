//! Domain layer for the overlord engine
//!
//! Pure models, port traits for external collaborators, and error types.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{CatalogError, DomainError, DomainResult, ManufactureError};
