//! Engine tunables: defaults, optional JSON config file, CLI/env overrides.

use std::fs;
use std::path::Path;

use clap::Args;
use serde::{Deserialize, Serialize};
use shuttle_core::{ClusterParams, HealthThresholds};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("radius_m must be a positive finite number (got {0})")]
    InvalidRadius(f64),
    #[error("min_points must be at least 1")]
    InvalidMinPoints,
    #[error("recency_window_secs must be positive (got {0})")]
    InvalidRecencyWindow(i64),
    #[error("health thresholds must satisfy 0 <= active ({active}s) <= stale ({stale}s)")]
    InvalidThresholds { active: i64, stale: i64 },
    #[error("{0}")]
    Read(String),
    #[error("{0}")]
    Parse(String),
}

/// All tunables of one compute pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cluster: ClusterParams,
    pub health: HealthThresholds,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let radius = self.cluster.radius_m;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(ConfigError::InvalidRadius(radius));
        }
        if self.cluster.min_points == 0 {
            return Err(ConfigError::InvalidMinPoints);
        }
        if self.cluster.recency_window_secs <= 0 {
            return Err(ConfigError::InvalidRecencyWindow(
                self.cluster.recency_window_secs,
            ));
        }
        let (active, stale) = (
            self.health.active_within_secs,
            self.health.stale_within_secs,
        );
        if active < 0 || active > stale {
            return Err(ConfigError::InvalidThresholds { active, stale });
        }
        Ok(())
    }
}

/// Reads an [`EngineConfig`] from JSON; missing fields keep their defaults.
pub fn load_config_file(path: &Path) -> Result<EngineConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|error| {
        ConfigError::Read(format!(
            "failed to read config file '{}': {error}",
            path.display()
        ))
    })?;
    serde_json::from_str(&contents).map_err(|error| {
        ConfigError::Parse(format!("invalid config file '{}': {error}", path.display()))
    })
}

/// Command-line and environment overrides for the engine tunables.
#[derive(Debug, Clone, Default, Args)]
pub struct TuningArgs {
    /// Clustering neighborhood radius in meters [default: 1000]
    #[arg(long, env = "SHUTTLE_RADIUS_M", global = true)]
    pub radius_m: Option<f64>,

    /// Minimum points (including itself) for a core point [default: 2]
    #[arg(long, env = "SHUTTLE_MIN_POINTS", global = true)]
    pub min_points: Option<usize>,

    /// Only pings this recent (seconds) are clustered [default: 300]
    #[arg(long, env = "SHUTTLE_RECENCY_WINDOW_SECS", global = true)]
    pub recency_window_secs: Option<i64>,

    /// Last-ping age (seconds) up to which a trip is ACTIVE [default: 120]
    #[arg(long, env = "SHUTTLE_ACTIVE_WITHIN_SECS", global = true)]
    pub active_within_secs: Option<i64>,

    /// Last-ping age (seconds) up to which a trip is STALE [default: 600]
    #[arg(long, env = "SHUTTLE_STALE_WITHIN_SECS", global = true)]
    pub stale_within_secs: Option<i64>,
}

impl TuningArgs {
    pub fn apply(&self, mut config: EngineConfig) -> EngineConfig {
        if let Some(radius_m) = self.radius_m {
            config.cluster.radius_m = radius_m;
        }
        if let Some(min_points) = self.min_points {
            config.cluster.min_points = min_points;
        }
        if let Some(secs) = self.recency_window_secs {
            config.cluster.recency_window_secs = secs;
        }
        if let Some(secs) = self.active_within_secs {
            config.health.active_within_secs = secs;
        }
        if let Some(secs) = self.stale_within_secs {
            config.health.stale_within_secs = secs;
        }
        config
    }
}

/// Defaults, then the optional config file, then overrides; validated.
pub fn resolve_config(
    config_file: Option<&Path>,
    overrides: &TuningArgs,
) -> Result<EngineConfig, ConfigError> {
    let base = match config_file {
        Some(path) => load_config_file(path)?,
        None => EngineConfig::default(),
    };
    let config = overrides.apply(base);
    config.validate()?;
    Ok(config)
}
