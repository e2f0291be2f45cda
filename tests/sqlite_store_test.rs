//! Zone state persisted in a file-backed SQLite database.

mod common;

use overlord::adapters::sqlite::{initialize_database, Migrator, SqliteZoneStore};
use overlord::domain::models::{
    BlockageEntry, ExpansionKind, Position, PriorityRecord, PrioritySet, TaskCatalog, TaskKind,
    ZoneId, ZoneState, ZONE_STATE_VERSION,
};
use overlord::domain::ports::ZoneStore;

fn sample_state(zone: &str) -> ZoneState {
    let mut state = ZoneState::new(ZoneId::new(zone));
    let set: PrioritySet = [
        PriorityRecord::new(TaskKind::TowerRefueling, 42.0),
        PriorityRecord::expansion(ExpansionKind::Harassment, 55.0),
    ]
    .into_iter()
    .collect();
    state.priority_history.push_back(set);
    state.blockage_ledger.insert(
        TaskKind::RoadConstruction,
        BlockageEntry {
            cycle: 140,
            permanent: false,
        },
    );
    state.banned_anchors.insert(Position::new(zone, 12, 30));
    state.last_scout_request = Some(77);
    state
}

#[tokio::test]
async fn test_state_survives_reopen() {
    common::setup_test_logging();
    let (_dir, path) = common::temp_db_path();
    let path = path.to_string_lossy().to_string();
    let catalog = TaskCatalog::standard().unwrap();

    {
        let pool = initialize_database(&path, None).await.unwrap();
        let store = SqliteZoneStore::new(pool.clone(), catalog.clone());
        store.save(&sample_state("W1N1")).await.unwrap();
        store.save(&sample_state("W2N2")).await.unwrap();
        pool.close().await;
    }

    let pool = initialize_database(&path, None).await.unwrap();
    let store = SqliteZoneStore::new(pool, catalog);

    assert_eq!(
        store.list().await.unwrap(),
        vec![ZoneId::new("W1N1"), ZoneId::new("W2N2")]
    );
    let loaded = store.load(&ZoneId::new("W1N1")).await.unwrap().unwrap();
    let expected = sample_state("W1N1");
    assert_eq!(loaded.priority_history, expected.priority_history);
    assert_eq!(loaded.blockage_ledger, expected.blockage_ledger);
    assert_eq!(loaded.banned_anchors, expected.banned_anchors);
    assert_eq!(loaded.last_scout_request, Some(77));
    assert_eq!(
        loaded.latest_priorities().unwrap().expansion_kind(),
        Some(ExpansionKind::Harassment)
    );
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let (_dir, path) = common::temp_db_path();
    let path = path.to_string_lossy().to_string();

    let pool = initialize_database(&path, None).await.unwrap();
    let migrator = Migrator::new(pool.clone());
    assert_eq!(migrator.get_current_version().await.unwrap(), 2);
    pool.close().await;

    let pool = initialize_database(&path, None).await.unwrap();
    let migrator = Migrator::new(pool);
    assert_eq!(migrator.get_current_version().await.unwrap(), 2);
}

#[tokio::test]
async fn test_save_replaces_and_delete_removes() {
    let (_dir, path) = common::temp_db_path();
    let pool = initialize_database(&path.to_string_lossy(), None).await.unwrap();
    let store = SqliteZoneStore::new(pool.clone(), TaskCatalog::standard().unwrap());
    let zone = ZoneId::new("W1N1");

    let mut state = sample_state("W1N1");
    store.save(&state).await.unwrap();
    state.priority_history.push_back(PrioritySet::new());
    state.last_scout_request = None;
    store.save(&state).await.unwrap();

    let (depth,): (i64,) = sqlx::query_as("SELECT history_depth FROM zone_states WHERE zone = ?")
        .bind("W1N1")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(depth, 2);
    let loaded = store.load(&zone).await.unwrap().unwrap();
    assert_eq!(loaded.last_scout_request, None);

    assert!(store.delete(&zone).await.unwrap());
    assert!(!store.delete(&zone).await.unwrap());
    assert!(store.load(&zone).await.unwrap().is_none());
    assert_eq!(store.load_or_init(&zone).await.unwrap().history_len(), 0);
}

#[tokio::test]
async fn test_legacy_document_is_upgraded_on_load() {
    let (_dir, path) = common::temp_db_path();
    let pool = initialize_database(&path.to_string_lossy(), None).await.unwrap();
    let legacy = r#"{
        "prioHistory": [{"8": {"prio": 30}, "5": {"prio": 60, "type": "obliteration"}, "99": {"prio": 1}}],
        "taskIdsToBlockageTimes": {"6": 500, "15": -1},
        "bannedAnchors": [{"x": 4, "y": 9, "roomName": "W1N1"}],
        "lastScoutPrioTick": 1200
    }"#;
    sqlx::query("INSERT INTO zone_states (zone, version, state, updated_at) VALUES (?, 1, ?, ?)")
        .bind("W1N1")
        .bind(legacy)
        .bind("2024-01-01T00:00:00+00:00")
        .execute(&pool)
        .await
        .unwrap();

    let store = SqliteZoneStore::new(pool, TaskCatalog::standard().unwrap());
    let state = store.load(&ZoneId::new("W1N1")).await.unwrap().unwrap();

    assert_eq!(state.version, ZONE_STATE_VERSION);
    let latest = state.latest_priorities().unwrap();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest.score(TaskKind::TowerRefueling), Some(30.0));
    assert_eq!(latest.expansion_kind(), Some(ExpansionKind::Obliteration));
    assert_eq!(
        state.blockage_ledger[&TaskKind::RoadConstruction],
        BlockageEntry {
            cycle: 500,
            permanent: false
        }
    );
    assert!(state.blockage_ledger[&TaskKind::Scouting].permanent);
    assert!(state.banned_anchors.contains(&Position::new("W1N1", 4, 9)));
    assert_eq!(state.last_scout_request, Some(1200));
}
