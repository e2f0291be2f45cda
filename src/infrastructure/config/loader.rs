use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::{Config, StoreBackend};

/// Configuration error types
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid history_depth: {0}. Must be at least 1")]
    InvalidHistoryDepth(usize),

    #[error("Invalid compute_threshold: {0}. Must be in (0, 1]")]
    InvalidComputeThreshold(f64),

    #[error("Invalid {name}: {value}. Must not be negative")]
    NegativeTunable { name: &'static str, value: f64 },

    #[error("Invalid schedule interval {name}: must be at least 1")]
    ZeroInterval { name: &'static str },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. .overlord/config.yaml
    /// 3. .overlord/local.yaml (optional local overrides)
    /// 4. Environment variables (OVERLORD_* prefix, `__` separates sections)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(Path::new("."))
    }

    /// Same as [`ConfigLoader::load`] with `.overlord/` resolved against `root`.
    pub fn load_from_dir(root: &Path) -> Result<Config> {
        let dir = root.join(".overlord");
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed("OVERLORD_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring the
    /// environment.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("OVERLORD_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let store = &config.store;
        if store.backend == StoreBackend::Sqlite {
            if store.path.is_empty() {
                return Err(ConfigError::EmptyDatabasePath);
            }
            if store.max_connections == 0 {
                return Err(ConfigError::InvalidMaxConnections(store.max_connections));
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let engine = &config.engine;
        if engine.history_depth == 0 {
            return Err(ConfigError::InvalidHistoryDepth(engine.history_depth));
        }
        if !(engine.compute_threshold > 0.0 && engine.compute_threshold <= 1.0) {
            return Err(ConfigError::InvalidComputeThreshold(engine.compute_threshold));
        }
        for (name, value) in [
            ("hysteresis_margin", engine.hysteresis_margin),
            ("claim_decrement", engine.claim_decrement),
            ("idle_floor_threshold", engine.idle_floor_threshold),
        ] {
            if value < 0.0 {
                return Err(ConfigError::NegativeTunable { name, value });
            }
        }
        if engine.max_body_parts == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_body_parts must be at least 1".to_string(),
            ));
        }

        let schedule = &config.schedule;
        for (name, value) in [
            ("sweep_interval", schedule.sweep_interval),
            ("defense_interval", schedule.defense_interval),
            ("decision_interval", schedule.decision_interval),
            ("siege_interval", schedule.siege_interval),
            ("unsafe_reset_interval", schedule.unsafe_reset_interval),
            ("full_reset_interval", schedule.full_reset_interval),
            ("anchor_reset_interval", schedule.anchor_reset_interval),
            ("compute_window", schedule.compute_window),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroInterval { name });
            }
        }

        Ok(())
    }
}
