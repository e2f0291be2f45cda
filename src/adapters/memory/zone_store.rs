//! Volatile ZoneStore kept in process memory.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ZoneId, ZoneState};
use crate::domain::ports::ZoneStore;

#[derive(Debug, Default)]
pub struct InMemoryZoneStore {
    zones: RwLock<BTreeMap<ZoneId, ZoneState>>,
}

impl InMemoryZoneStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ZoneStore for InMemoryZoneStore {
    async fn load(&self, zone: &ZoneId) -> DomainResult<Option<ZoneState>> {
        Ok(self.zones.read().await.get(zone).cloned())
    }

    async fn save(&self, state: &ZoneState) -> DomainResult<()> {
        self.zones
            .write()
            .await
            .insert(state.zone.clone(), state.clone());
        Ok(())
    }

    async fn list(&self) -> DomainResult<Vec<ZoneId>> {
        Ok(self.zones.read().await.keys().cloned().collect())
    }

    async fn delete(&self, zone: &ZoneId) -> DomainResult<bool> {
        Ok(self.zones.write().await.remove(zone).is_some())
    }
}
