use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for overlord
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Engine tunables
    #[serde(default)]
    pub engine: EngineConfig,

    /// Periodic maintenance cadence
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Durable zone state backend
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Empirically tuned constants of the prioritization and assignment engine.
///
/// These are reproduced as-is and exposed only so that deployments can
/// override them; the defaults are the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct EngineConfig {
    /// Minimum score advantage before a bound unit is rebound.
    pub hysteresis_margin: f64,
    /// Score consumed from an objective each time a unit claims it.
    pub claim_decrement: f64,
    /// Number of retained priority snapshots per zone.
    pub history_depth: usize,
    /// Cycles a non-permanent block stays in force.
    pub blockage_duration: u64,
    /// Below this best score a capable unit falls back to upgrading.
    pub idle_floor_threshold: f64,
    pub upgrade_floor_score: f64,
    pub scout_spawn_score: f64,
    pub harvest_fallback_score: f64,
    pub transfer_score: f64,
    pub upgrade_score: f64,
    pub upgrade_urgent_score: f64,
    /// Controller downgrade ticks below which upgrading is urgent.
    pub downgrade_risk_ticks: u32,
    pub defense_score: f64,
    /// Added to the rampart-versus-defender balance before comparing.
    pub defender_bias: i64,
    /// Hostile body parts at which a zone enters siege mode.
    pub siege_body_parts: u32,
    pub siege_override_score: f64,
    /// Averaged compute usage above which production is skipped.
    pub compute_threshold: f64,
    /// Unsafe reports per objective before it is blocked permanently.
    pub unsafe_escalation_threshold: u32,
    pub desired_wall_hits: u64,
    pub upgrade_throttle_storage: u64,
    pub upgrade_throttle_ticks: u32,
    pub receiver_throttle_storage: u64,
    pub wall_scan_range: u32,
    pub scout_request_interval: u64,
    pub claimer_cap: usize,
    pub stall_limit: usize,
    pub stall_adjacency_margin: u64,
    pub max_body_parts: usize,
    /// Minerals whose presence makes a target zone maximally attractive.
    pub desired_minerals: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hysteresis_margin: 10.0,
            claim_decrement: 15.0,
            history_depth: 3,
            blockage_duration: 100,
            idle_floor_threshold: 5.0,
            upgrade_floor_score: 20.0,
            scout_spawn_score: 95.0,
            harvest_fallback_score: 100.0,
            transfer_score: 90.0,
            upgrade_score: 90.0,
            upgrade_urgent_score: 100.0,
            downgrade_risk_ticks: 20_000,
            defense_score: 75.0,
            defender_bias: 2,
            siege_body_parts: 100,
            siege_override_score: 50.0,
            compute_threshold: 0.95,
            unsafe_escalation_threshold: 20,
            desired_wall_hits: 5_000_000,
            upgrade_throttle_storage: 200_000,
            upgrade_throttle_ticks: 2_000,
            receiver_throttle_storage: 25_000,
            wall_scan_range: 15,
            scout_request_interval: 1_000,
            claimer_cap: 1,
            stall_limit: 5,
            stall_adjacency_margin: 2,
            max_body_parts: 50,
            desired_minerals: vec!["X".to_string()],
        }
    }
}

/// Cycle intervals of the scheduled passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ScheduleConfig {
    pub sweep_interval: u64,
    pub defense_interval: u64,
    pub decision_interval: u64,
    pub siege_interval: u64,
    pub unsafe_reset_interval: u64,
    pub full_reset_interval: u64,
    pub anchor_reset_interval: u64,
    /// Compute samples are averaged over windows of this many cycles.
    pub compute_window: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            sweep_interval: 3,
            defense_interval: 5,
            decision_interval: 7,
            siege_interval: 31,
            unsafe_reset_interval: 109,
            full_reset_interval: 5_119,
            anchor_reset_interval: 30_341,
            compute_window: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

/// Zone store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

const fn default_backend() -> StoreBackend {
    StoreBackend::Sqlite
}

fn default_database_path() -> String {
    ".overlord/overlord.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for stdout
    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    /// Directory for log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub enable_stdout: bool,

    #[serde(default)]
    pub rotation: RotationPolicy,
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

const fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            enable_stdout: true,
            rotation: RotationPolicy::default(),
        }
    }
}
