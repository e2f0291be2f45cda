//! CLI command implementations.

pub mod catalog;
pub mod simulate;
pub mod zone;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

use crate::adapters::memory::InMemoryZoneStore;
use crate::adapters::sqlite::{initialize_database, PoolConfig, SqliteZoneStore};
use crate::domain::models::{StoreBackend, StoreConfig, TaskCatalog};
use crate::domain::ports::ZoneStore;

/// Open the configured zone store, creating and migrating the database
/// when needed.
pub async fn open_store(config: &StoreConfig, catalog: TaskCatalog) -> Result<Arc<dyn ZoneStore>> {
    match config.backend {
        StoreBackend::Memory => {
            debug!("using in-memory zone store");
            Ok(Arc::new(InMemoryZoneStore::new()))
        }
        StoreBackend::Sqlite => {
            let pool_config = PoolConfig {
                max_connections: config.max_connections,
                ..PoolConfig::default()
            };
            let pool = initialize_database(&config.path, Some(pool_config))
                .await
                .with_context(|| format!("Failed to open zone store at {}", config.path))?;
            debug!(path = %config.path, "using sqlite zone store");
            Ok(Arc::new(SqliteZoneStore::new(pool, catalog)))
        }
    }
}
