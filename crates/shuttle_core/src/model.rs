//! Records read from the store snapshot and records produced per call.
//!
//! `Ping` and `Trip` are owned by the store; the core only reads them.
//! `Cluster` and `HealthStatus` are ephemeral and recomputed on every call.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{is_valid_coordinate, GeoPoint};

/// Accuracy assumed when a ping carries none (or an unusable one).
pub const DEFAULT_ACCURACY_M: f64 = 50.0;

/// Floor applied to accuracy before it is inverted into a centroid weight.
pub const MIN_WEIGHTING_ACCURACY_M: f64 = 1.0;

/// One rider's timestamped location report for a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ping {
    pub trip_code: String,
    pub rider_id: String,
    pub timestamp: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, rename = "accuracy", skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
}

impl Ping {
    pub fn new(
        trip_code: impl Into<String>,
        rider_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        lat: f64,
        lng: f64,
    ) -> Self {
        Self {
            trip_code: trip_code.into(),
            rider_id: rider_id.into(),
            timestamp,
            lat,
            lng,
            accuracy_m: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    /// Malformed pings (non-finite or out-of-range coordinates) are ignored everywhere.
    pub fn has_valid_position(&self) -> bool {
        is_valid_coordinate(self.lat, self.lng)
    }

    /// Reported accuracy, or [`DEFAULT_ACCURACY_M`] when missing or not positive.
    pub fn effective_accuracy_m(&self) -> f64 {
        match self.accuracy_m {
            Some(accuracy) if accuracy.is_finite() && accuracy > 0.0 => accuracy,
            _ => DEFAULT_ACCURACY_M,
        }
    }

    /// Centroid weight: `1 / max(accuracy, 1m)`.
    pub fn centroid_weight(&self) -> f64 {
        1.0 / self.effective_accuracy_m().max(MIN_WEIGHTING_ACCURACY_M)
    }
}

/// A registered trip, independent of whether it has pings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub code: String,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    pub fn new(code: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            created_at,
        }
    }
}

/// The dominant grouping of a trip's recent riders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub trip_code: String,
    pub center: GeoPoint,
    /// `rider_count / total_riders`, clamped to `[0, 1]`.
    pub strength: f64,
    pub rider_count: usize,
    /// Distinct riders ever seen for the trip.
    pub total_riders: usize,
    pub computed_at: DateTime<Utc>,
    /// Member rider ids in cluster-discovery order.
    pub rider_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthTier {
    Active,
    Stale,
    Inactive,
    NoSignal,
}

impl HealthTier {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthTier::Active => "ACTIVE",
            HealthTier::Stale => "STALE",
            HealthTier::Inactive => "INACTIVE",
            HealthTier::NoSignal => "NO_SIGNAL",
        }
    }
}

impl fmt::Display for HealthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub trip_code: String,
    pub tier: HealthTier,
    pub message: String,
    /// Timestamp of the most recent valid ping; `None` only for [`HealthTier::NoSignal`].
    pub last_update: Option<DateTime<Utc>>,
}
