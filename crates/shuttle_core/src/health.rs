//! Trip liveness classification from the age of the most recent ping.
//!
//! Independent of the recency filter: the full ping history is scanned, and
//! every registered trip gets a status even if it never reported.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::model::{HealthStatus, HealthTier, Ping, Trip};
use crate::params::HealthThresholds;

/// Tier for a last-update instant observed at `now`.
pub fn classify(
    now: DateTime<Utc>,
    last_update: Option<DateTime<Utc>>,
    thresholds: &HealthThresholds,
) -> HealthTier {
    let Some(last_update) = last_update else {
        return HealthTier::NoSignal;
    };
    let age = now.signed_duration_since(last_update);
    if age <= thresholds.active_within() {
        HealthTier::Active
    } else if age <= thresholds.stale_within() {
        HealthTier::Stale
    } else {
        HealthTier::Inactive
    }
}

fn rounded_minutes(now: DateTime<Utc>, last_update: DateTime<Utc>) -> i64 {
    let age_ms = now.signed_duration_since(last_update).num_milliseconds();
    (age_ms as f64 / 60_000.0).round() as i64
}

fn message_for(tier: HealthTier, now: DateTime<Utc>, last_update: Option<DateTime<Utc>>) -> String {
    match (tier, last_update) {
        (HealthTier::Active, _) => "Live".to_string(),
        (HealthTier::Stale, Some(at)) => {
            format!("Last update {} min ago", rounded_minutes(now, at))
        }
        (HealthTier::Inactive, Some(at)) => {
            format!("No update for {} min", rounded_minutes(now, at))
        }
        _ => "No signal yet".to_string(),
    }
}

/// Builds the status record for one trip.
pub fn trip_health(
    trip_code: &str,
    last_update: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    thresholds: &HealthThresholds,
) -> HealthStatus {
    let tier = classify(now, last_update, thresholds);
    HealthStatus {
        trip_code: trip_code.to_string(),
        tier,
        message: message_for(tier, now, last_update),
        last_update,
    }
}

/// Most recent well-formed ping timestamp per trip code.
pub fn latest_ping_by_trip(pings: &[Ping]) -> HashMap<&str, DateTime<Utc>> {
    let mut latest: HashMap<&str, DateTime<Utc>> = HashMap::new();
    for ping in pings.iter().filter(|ping| ping.has_valid_position()) {
        latest
            .entry(ping.trip_code.as_str())
            .and_modify(|at| *at = (*at).max(ping.timestamp))
            .or_insert(ping.timestamp);
    }
    latest
}

/// Computes a status for every registered trip.
pub fn compute_health(
    pings: &[Ping],
    trips: &[Trip],
    now: DateTime<Utc>,
    thresholds: &HealthThresholds,
) -> BTreeMap<String, HealthStatus> {
    let latest = latest_ping_by_trip(pings);
    trips
        .iter()
        .map(|trip| {
            let last_update = latest.get(trip.code.as_str()).copied();
            let status = trip_health(&trip.code, last_update, now, thresholds);
            tracing::debug!(trip_code = %trip.code, tier = %status.tier, "trip health classified");
            (trip.code.clone(), status)
        })
        .collect()
}
