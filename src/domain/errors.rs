//! Domain errors for the overlord engine.

use thiserror::Error;

use crate::domain::models::unit::UnitType;

/// Catalog integrity errors. Fatal at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Unknown task id: {0}")]
    UnknownTaskId(u16),

    #[error("Duplicate task id in catalog: {0}")]
    DuplicateTaskId(u16),
}

/// Failures reported by the manufacture collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManufactureError {
    #[error("Insufficient resources to manufacture {unit_type}: need {needed}, have {available}")]
    InsufficientResources {
        unit_type: UnitType,
        needed: u32,
        available: u64,
    },

    #[error("No production facility in zone {0}")]
    NoProductionFacility(String),

    #[error("Production facility in zone {0} is busy")]
    FacilityBusy(String),
}

/// Domain-level errors that can occur in the overlord engine.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    #[error("Zone state migration failed: {0}")]
    MigrationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Scenario error: {0}")]
    ScenarioError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for DomainError {
    fn from(err: serde_yaml::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
