//! Write rules shared by every store backend.

use chrono::{DateTime, Utc};
use shuttle_core::{Ping, Trip};

use crate::codes::{generate_trip_code, MAX_CODE_ATTEMPTS};
use crate::error::{StoreError, ValidationError};
use crate::source::Snapshot;
use crate::upsert::{upsert_latest, UpsertOutcome};

fn is_registered(state: &Snapshot, code: &str) -> bool {
    state.trips.iter().any(|trip| trip.code == code)
}

/// Registers a trip under `code`, or under a freshly generated code.
pub(crate) fn register_trip(
    state: &mut Snapshot,
    code: Option<&str>,
    created_at: DateTime<Utc>,
) -> Result<Trip, StoreError> {
    let code = match code {
        Some(code) => {
            let code = code.trim();
            if code.is_empty() {
                return Err(ValidationError::new("trip code must be a non-empty string").into());
            }
            if is_registered(state, code) {
                return Err(StoreError::DuplicateTrip(code.to_string()));
            }
            code.to_string()
        }
        None => {
            let mut rng = rand::thread_rng();
            let mut generated = None;
            for _ in 0..MAX_CODE_ATTEMPTS {
                let candidate = generate_trip_code(&mut rng);
                if !is_registered(state, &candidate) {
                    generated = Some(candidate);
                    break;
                }
            }
            generated.ok_or(StoreError::CodeSpaceExhausted(MAX_CODE_ATTEMPTS))?
        }
    };

    let trip = Trip::new(code, created_at);
    state.trips.push(trip.clone());
    tracing::info!(trip_code = %trip.code, "trip registered");
    Ok(trip)
}

/// Validates and upserts one ping for a registered trip.
pub(crate) fn record_ping(state: &mut Snapshot, ping: Ping) -> Result<UpsertOutcome, StoreError> {
    if ping.trip_code.trim().is_empty() || ping.rider_id.trim().is_empty() {
        return Err(ValidationError::new("tripCode and riderId must be non-empty").into());
    }
    if !ping.has_valid_position() {
        return Err(ValidationError::new(format!(
            "ping from rider '{}' has invalid coordinates",
            ping.rider_id
        ))
        .into());
    }
    if matches!(ping.accuracy_m, Some(accuracy) if !(accuracy.is_finite() && accuracy > 0.0)) {
        return Err(ValidationError::new(format!(
            "ping from rider '{}' has a non-positive accuracy",
            ping.rider_id
        ))
        .into());
    }
    if !is_registered(state, &ping.trip_code) {
        return Err(StoreError::UnknownTrip(ping.trip_code));
    }

    let (trip_code, rider_id) = (ping.trip_code.clone(), ping.rider_id.clone());
    let outcome = upsert_latest(&mut state.pings, ping);
    tracing::debug!(%trip_code, %rider_id, ?outcome, "ping recorded");
    Ok(outcome)
}
