use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Default neighborhood radius for clustering (meters).
pub const DEFAULT_RADIUS_M: f64 = 1_000.0;

/// Default minimum core size (the point itself plus its neighbors).
pub const DEFAULT_MIN_POINTS: usize = 2;

/// Default freshness window for clustering input: 5 minutes.
pub const DEFAULT_RECENCY_WINDOW_SECS: i64 = 5 * 60;

/// Last-ping age up to which a trip is ACTIVE: 2 minutes.
pub const DEFAULT_ACTIVE_WITHIN_SECS: i64 = 2 * 60;

/// Last-ping age up to which a trip is STALE: 10 minutes.
pub const DEFAULT_STALE_WITHIN_SECS: i64 = 10 * 60;

fn seconds(secs: i64) -> TimeDelta {
    TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX)
}

/// Tunables for the recency filter and the cluster engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Neighborhood radius in meters.
    pub radius_m: f64,
    /// Minimum number of points (including itself) within `radius_m` for a core point.
    pub min_points: usize,
    /// Only pings at most this old take part in clustering.
    pub recency_window_secs: i64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_RADIUS_M,
            min_points: DEFAULT_MIN_POINTS,
            recency_window_secs: DEFAULT_RECENCY_WINDOW_SECS,
        }
    }
}

impl ClusterParams {
    pub fn with_radius_m(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    pub fn with_recency_window_secs(mut self, secs: i64) -> Self {
        self.recency_window_secs = secs;
        self
    }

    pub fn recency_window(&self) -> TimeDelta {
        seconds(self.recency_window_secs)
    }
}

/// Age thresholds separating ACTIVE, STALE and INACTIVE trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthThresholds {
    pub active_within_secs: i64,
    pub stale_within_secs: i64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            active_within_secs: DEFAULT_ACTIVE_WITHIN_SECS,
            stale_within_secs: DEFAULT_STALE_WITHIN_SECS,
        }
    }
}

impl HealthThresholds {
    pub fn new(active_within_secs: i64, stale_within_secs: i64) -> Self {
        Self {
            active_within_secs,
            stale_within_secs,
        }
    }

    pub fn active_within(&self) -> TimeDelta {
        seconds(self.active_within_secs)
    }

    pub fn stale_within(&self) -> TimeDelta {
        seconds(self.stale_within_secs)
    }
}
