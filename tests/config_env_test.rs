//! Layered configuration feeding the engine.

use std::collections::BTreeMap;
use std::fs;

use overlord::adapters::scenario::ScenarioWorld;
use overlord::domain::models::StoreBackend;
use overlord::{ConfigLoader, CycleScheduler, World};

const SCENARIO: &str = r"
start_cycle: 1
zones:
  - view: { zone: W1N1, owner: me }
    units:
      - { id: w1, unit_type: worker }
";

#[test]
fn test_env_overrides_file_and_drives_schedule() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("overlord.yaml");
    fs::write(
        &path,
        "schedule:\n  decision_interval: 5\nstore:\n  backend: sqlite\n  path: /tmp/unused.db\n",
    )
    .unwrap();

    temp_env::with_vars(
        [
            ("OVERLORD_SCHEDULE__DECISION_INTERVAL", Some("2")),
            ("OVERLORD_STORE__BACKEND", Some("memory")),
        ],
        || {
            let config = ConfigLoader::load_from_file(&path).unwrap();
            assert_eq!(config.schedule.decision_interval, 2);
            assert_eq!(config.store.backend, StoreBackend::Memory);
            assert_eq!(config.store.path, "/tmp/unused.db");

            let mut scheduler = CycleScheduler::new(&config).unwrap();
            let mut world = ScenarioWorld::from_yaml(SCENARIO).unwrap();
            let mut states = BTreeMap::new();
            let mut decided = Vec::new();
            for _ in 0..4 {
                let report = scheduler.run_cycle(&mut world, &mut states);
                decided.extend(report.decisions.iter().map(|d| d.cycle));
                world.advance();
            }
            assert_eq!(decided, vec![2, 4]);
        },
    );
}

#[test]
fn test_engine_tunables_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    temp_env::with_vars(
        [
            ("OVERLORD_ENGINE__HYSTERESIS_MARGIN", Some("4.5")),
            ("OVERLORD_ENGINE__BLOCKAGE_DURATION", Some("250")),
            ("OVERLORD_LOGGING__LEVEL", Some("warn")),
        ],
        || {
            let config = ConfigLoader::load_from_dir(dir.path()).unwrap();
            assert!((config.engine.hysteresis_margin - 4.5).abs() < f64::EPSILON);
            assert_eq!(config.engine.blockage_duration, 250);
            assert_eq!(config.engine.claim_decrement, 15.0);
            assert_eq!(config.logging.level, "warn");
        },
    );
}

#[test]
fn test_invalid_tunable_aborts_load() {
    let dir = tempfile::tempdir().unwrap();
    temp_env::with_var("OVERLORD_ENGINE__COMPUTE_THRESHOLD", Some("0"), || {
        let err = ConfigLoader::load_from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("compute_threshold"), "{err}");
    });
}
