//! Common test utilities for integration tests
//!
//! Fixtures shared across the integration test files.

#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;

use overlord::domain::models::{Position, SpawnView, StoreView, TaskBinding, TaskKind, Unit, UnitType, ZoneView};
use overlord::domain::ports::{PathCost, PathResult};

/// Create a temporary test database
///
/// Returns the path to a SQLite database file in a temporary directory.
pub fn temp_db_path() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("zones.db");
    (dir, db_path)
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Owned zone with an idle spawn and plenty of stored energy, so neither
/// the upgrade nor the receiver throttle applies.
pub fn rich_zone(name: &str) -> ZoneView {
    let mut view = ZoneView::new(name, "me");
    view.spawn = Some(SpawnView {
        name: format!("{name}-spawn"),
        pos: Position::new(name, 25, 25),
        busy: false,
    });
    view.storage = Some(StoreView::new(500_000, 1_000_000));
    view
}

pub fn worker(id: &str, body_size: u32) -> Unit {
    Unit::new(id, UnitType::Worker).with_body_size(body_size)
}

pub fn bound(id: &str, unit_type: UnitType, task: TaskKind) -> Unit {
    Unit::new(id, unit_type).with_binding(TaskBinding::Bound(task))
}

/// Straight-line pathing; everything is reachable.
pub struct FlatPath;

impl PathCost for FlatPath {
    fn path_cost(&self, origin: &Position, targets: &[Position], range: u32, _safe: bool) -> PathResult {
        targets
            .iter()
            .map(|t| origin.range_to(t).saturating_sub(range))
            .min()
            .map_or_else(PathResult::unreachable, |cost| PathResult::reachable(f64::from(cost)))
    }
}
