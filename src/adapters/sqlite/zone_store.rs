//! SQLite implementation of the ZoneStore.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::DomainResult;
use crate::domain::models::{migrate_zone_state, TaskCatalog, ZoneId, ZoneState};
use crate::domain::ports::ZoneStore;

/// Zone state persisted as one JSON document per zone. Documents written by
/// older schema versions are upgraded on load.
#[derive(Clone)]
pub struct SqliteZoneStore {
    pool: SqlitePool,
    catalog: TaskCatalog,
}

impl SqliteZoneStore {
    pub fn new(pool: SqlitePool, catalog: TaskCatalog) -> Self {
        Self { pool, catalog }
    }
}

#[derive(sqlx::FromRow)]
struct ZoneStateRow {
    zone: String,
    state: String,
}

impl ZoneStateRow {
    fn into_state(self, catalog: &TaskCatalog) -> DomainResult<ZoneState> {
        let raw: serde_json::Value = serde_json::from_str(&self.state)?;
        migrate_zone_state(&ZoneId::new(self.zone), raw, catalog)
    }
}

#[async_trait]
impl ZoneStore for SqliteZoneStore {
    async fn load(&self, zone: &ZoneId) -> DomainResult<Option<ZoneState>> {
        let row: Option<ZoneStateRow> = sqlx::query_as("SELECT zone, state FROM zone_states WHERE zone = ?")
            .bind(zone.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_state(&self.catalog)).transpose()
    }

    async fn save(&self, state: &ZoneState) -> DomainResult<()> {
        let json = serde_json::to_string(state)?;
        let depth = i64::try_from(state.history_len()).unwrap_or(i64::MAX);

        sqlx::query(
            r#"INSERT INTO zone_states (zone, version, state, updated_at, history_depth)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(zone) DO UPDATE SET
                   version = excluded.version,
                   state = excluded.state,
                   updated_at = excluded.updated_at,
                   history_depth = excluded.history_depth"#,
        )
        .bind(state.zone.as_str())
        .bind(i64::from(state.version))
        .bind(&json)
        .bind(state.updated_at.to_rfc3339())
        .bind(depth)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self) -> DomainResult<Vec<ZoneId>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT zone FROM zone_states ORDER BY zone ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(zone,)| ZoneId::new(zone)).collect())
    }

    async fn delete(&self, zone: &ZoneId) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM zone_states WHERE zone = ?")
            .bind(zone.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::{PriorityRecord, TaskKind};

    async fn store() -> SqliteZoneStore {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteZoneStore::new(pool, TaskCatalog::standard().unwrap())
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = store().await;
        let zone = ZoneId::new("W1N1");
        let mut state = ZoneState::new(zone.clone());
        state
            .priority_history
            .push_back([PriorityRecord::new(TaskKind::TowerRefueling, 42.0)].into_iter().collect());

        store.save(&state).await.unwrap();
        let loaded = store.load(&zone).await.unwrap().unwrap();

        assert_eq!(loaded.priority_history, state.priority_history);
        assert_eq!(store.list().await.unwrap(), vec![zone.clone()]);
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = store().await;
        let zone = ZoneId::new("W1N1");
        let mut state = ZoneState::new(zone.clone());
        store.save(&state).await.unwrap();
        state.last_scout_request = Some(1200);
        store.save(&state).await.unwrap();

        let loaded = store.load(&zone).await.unwrap().unwrap();
        assert_eq!(loaded.last_scout_request, Some(1200));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_legacy_document_is_upgraded() {
        let store = store().await;
        sqlx::query("INSERT INTO zone_states (zone, version, state, updated_at) VALUES (?, 1, ?, ?)")
            .bind("W5N5")
            .bind(r#"{"prioHistory":[{"8":{"prio":30}}],"taskIdsToBlockageTimes":{"6":-1}}"#)
            .bind("2026-01-01T00:00:00Z")
            .execute(&store.pool)
            .await
            .unwrap();

        let loaded = store.load(&ZoneId::new("W5N5")).await.unwrap().unwrap();
        assert_eq!(loaded.history_len(), 1);
        assert!(loaded.blockage_ledger[&TaskKind::RoadConstruction].permanent);
    }

    #[tokio::test]
    async fn test_delete_and_missing() {
        let store = store().await;
        let zone = ZoneId::new("W1N1");
        assert!(store.load(&zone).await.unwrap().is_none());
        store.save(&ZoneState::new(zone.clone())).await.unwrap();
        assert!(store.delete(&zone).await.unwrap());
        assert!(!store.delete(&zone).await.unwrap());
    }
}
