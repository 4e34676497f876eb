//! Wire records as found in the store file, and their validation into core types.
//!
//! Entries are ad hoc JSON: coordinates may be numbers or numeric strings and
//! timestamps may be RFC 3339 strings or epoch milliseconds. Every entry is
//! validated on its own so one bad entry never hides the rest.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shuttle_core::geo::is_valid_coordinate;
use shuttle_core::{Ping, Trip};

use crate::error::ValidationError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingRecord {
    #[serde(default)]
    pub trip_code: Option<String>,
    #[serde(default)]
    pub rider_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub lat: Option<Value>,
    #[serde(default)]
    pub lng: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub created_at: Option<Value>,
}

fn required_text(value: Option<String>, field: &str) -> Result<String, ValidationError> {
    let text = value.unwrap_or_default();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(format!("{field} must be a non-empty string")));
    }
    Ok(trimmed.to_string())
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn instant(value: Option<&Value>, field: &str) -> Result<DateTime<Utc>, ValidationError> {
    let parsed = match value {
        Some(Value::String(text)) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|at| at.with_timezone(&Utc)),
        Some(Value::Number(millis)) => millis
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    };
    parsed.ok_or_else(|| {
        ValidationError::new(format!(
            "{field} must be an RFC 3339 string or epoch milliseconds"
        ))
    })
}

pub fn format_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl TryFrom<PingRecord> for Ping {
    type Error = ValidationError;

    fn try_from(record: PingRecord) -> Result<Self, Self::Error> {
        let trip_code = required_text(record.trip_code, "tripCode")?;
        let rider_id = required_text(record.rider_id, "riderId")?;
        let timestamp = instant(record.timestamp.as_ref(), "timestamp")?;

        let lat = record.lat.as_ref().and_then(number);
        let lng = record.lng.as_ref().and_then(number);
        let (lat, lng) = match (lat, lng) {
            (Some(lat), Some(lng)) if is_valid_coordinate(lat, lng) => (lat, lng),
            _ => {
                return Err(ValidationError::new(format!(
                    "ping from rider '{rider_id}' has invalid coordinates"
                )))
            }
        };

        let accuracy_m = match record.accuracy.as_ref() {
            None | Some(Value::Null) => None,
            Some(value) => match number(value) {
                Some(accuracy) if accuracy.is_finite() && accuracy > 0.0 => Some(accuracy),
                _ => {
                    return Err(ValidationError::new(format!(
                        "ping from rider '{rider_id}' has a non-positive accuracy"
                    )))
                }
            },
        };

        Ok(Ping {
            trip_code,
            rider_id,
            timestamp,
            lat,
            lng,
            accuracy_m,
        })
    }
}

impl From<&Ping> for PingRecord {
    fn from(ping: &Ping) -> Self {
        Self {
            trip_code: Some(ping.trip_code.clone()),
            rider_id: Some(ping.rider_id.clone()),
            timestamp: Some(Value::from(format_instant(ping.timestamp))),
            lat: Some(Value::from(ping.lat)),
            lng: Some(Value::from(ping.lng)),
            accuracy: ping.accuracy_m.map(Value::from),
        }
    }
}

impl TryFrom<TripRecord> for Trip {
    type Error = ValidationError;

    fn try_from(record: TripRecord) -> Result<Self, Self::Error> {
        let code = required_text(record.code, "code")?;
        let created_at = instant(record.created_at.as_ref(), "createdAt")?;
        Ok(Trip { code, created_at })
    }
}

impl From<&Trip> for TripRecord {
    fn from(trip: &Trip) -> Self {
        Self {
            code: Some(trip.code.clone()),
            created_at: Some(Value::from(format_instant(trip.created_at))),
        }
    }
}

/// Validates one raw JSON entry as a ping.
pub fn ping_from_value(value: Value) -> Result<Ping, ValidationError> {
    let record: PingRecord = serde_json::from_value(value)
        .map_err(|error| ValidationError::new(format!("malformed ping entry: {error}")))?;
    Ping::try_from(record)
}

/// Validates one raw JSON entry as a trip.
pub fn trip_from_value(value: Value) -> Result<Trip, ValidationError> {
    let record: TripRecord = serde_json::from_value(value)
        .map_err(|error| ValidationError::new(format!("malformed trip entry: {error}")))?;
    Trip::try_from(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_numeric_strings_and_trims_identifiers() {
        let ping = ping_from_value(json!({
            "tripCode": " T1 ",
            "riderId": "R1",
            "timestamp": "2024-05-01T08:30:00.000Z",
            "lat": "6.5244",
            "lng": 3.3792,
            "accuracy": 12
        }))
        .expect("valid ping");
        assert_eq!(ping.trip_code, "T1");
        assert_eq!(ping.lat, 6.5244);
        assert_eq!(ping.accuracy_m, Some(12.0));
    }

    #[test]
    fn accepts_epoch_millis_timestamps() {
        let ping = ping_from_value(json!({
            "tripCode": "T1", "riderId": "R1", "timestamp": 1_714_552_200_000i64,
            "lat": 1.0, "lng": 1.0
        }))
        .expect("valid ping");
        assert_eq!(format_instant(ping.timestamp), "2024-05-01T08:30:00.000Z");
    }

    #[test]
    fn rejects_unparseable_timestamp() {
        let error = ping_from_value(json!({
            "tripCode": "T1", "riderId": "R1", "timestamp": "yesterday", "lat": 1.0, "lng": 1.0
        }))
        .expect_err("bad timestamp");
        assert_eq!(error.message(), "timestamp must be an RFC 3339 string or epoch milliseconds");
    }

    #[test]
    fn rejects_out_of_range_or_missing_coordinates() {
        for (lat, lng) in [(json!(91.0), json!(0.0)), (json!("abc"), json!(0.0)), (json!(null), json!(1.0))] {
            let result = ping_from_value(json!({
                "tripCode": "T1", "riderId": "R1", "timestamp": "2024-05-01T08:30:00Z",
                "lat": lat, "lng": lng
            }));
            assert!(result.is_err());
        }
    }

    #[test]
    fn rejects_non_positive_accuracy_but_allows_null() {
        let base = json!({
            "tripCode": "T1", "riderId": "R1", "timestamp": "2024-05-01T08:30:00Z",
            "lat": 1.0, "lng": 1.0
        });
        let mut zero = base.clone();
        zero["accuracy"] = json!(0);
        assert!(ping_from_value(zero).is_err());

        let mut null = base;
        null["accuracy"] = Value::Null;
        assert_eq!(ping_from_value(null).expect("valid").accuracy_m, None);
    }

    #[test]
    fn rejects_blank_trip_code_and_non_object_entries() {
        assert!(trip_from_value(json!({"code": "  ", "createdAt": "2024-05-01T08:30:00Z"})).is_err());
        assert!(trip_from_value(json!(42)).is_err());
        assert!(ping_from_value(json!("ping")).is_err());
    }

    #[test]
    fn typed_records_round_trip_through_wire_form() {
        let trip = trip_from_value(json!({"code": "ABC123", "createdAt": "2024-05-01T08:00:00Z"}))
            .expect("valid trip");
        let value = serde_json::to_value(TripRecord::from(&trip)).expect("serialize");
        assert_eq!(value["createdAt"], "2024-05-01T08:00:00.000Z");
        assert_eq!(trip_from_value(value).expect("valid trip"), trip);
    }
}
