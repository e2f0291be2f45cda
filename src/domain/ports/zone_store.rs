use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ZoneId, ZoneState};

/// Durable store for per-zone engine state.
///
/// Entries survive process restarts. Zones seen for the first time are
/// lazily initialized through [`ZoneStore::load_or_init`].
///
/// # Examples
///
/// ```no_run
/// use overlord::domain::ports::ZoneStore;
/// use overlord::domain::models::ZoneId;
///
/// async fn example(store: &dyn ZoneStore) -> overlord::domain::DomainResult<()> {
///     let mut state = store.load_or_init(&ZoneId::new("W1N1")).await?;
///     state.touch();
///     store.save(&state).await
/// }
/// ```
#[async_trait]
pub trait ZoneStore: Send + Sync {
    /// Load the state of a zone, `None` if it was never saved.
    async fn load(&self, zone: &ZoneId) -> DomainResult<Option<ZoneState>>;

    /// Insert or replace the state of a zone.
    async fn save(&self, state: &ZoneState) -> DomainResult<()>;

    /// All zones with stored state, in ascending order.
    async fn list(&self) -> DomainResult<Vec<ZoneId>>;

    /// Remove a zone's state. Returns whether anything was removed.
    async fn delete(&self, zone: &ZoneId) -> DomainResult<bool>;

    async fn load_or_init(&self, zone: &ZoneId) -> DomainResult<ZoneState> {
        Ok(self
            .load(zone)
            .await?
            .unwrap_or_else(|| ZoneState::new(zone.clone())))
    }
}
