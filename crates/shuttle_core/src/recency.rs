//! Recency filtering and per-trip grouping of pings.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, TimeDelta, Utc};

use crate::model::Ping;

/// True when the ping is at most `window` old at `now`.
///
/// Pings stamped after `now` count as fresh.
pub fn is_fresh(ping: &Ping, now: DateTime<Utc>, window: TimeDelta) -> bool {
    now.signed_duration_since(ping.timestamp) <= window
}

/// Pings with a valid position that are fresh at `now`, in input order.
pub fn recent_pings(pings: &[Ping], now: DateTime<Utc>, window: TimeDelta) -> Vec<&Ping> {
    let recent: Vec<&Ping> = pings
        .iter()
        .filter(|ping| ping.has_valid_position() && is_fresh(ping, now, window))
        .collect();
    tracing::debug!(
        total = pings.len(),
        recent = recent.len(),
        "recency filter applied"
    );
    recent
}

/// Groups pings by trip code, keeping input order within each trip.
pub fn group_by_trip<'a, I>(pings: I) -> BTreeMap<&'a str, Vec<&'a Ping>>
where
    I: IntoIterator<Item = &'a Ping>,
{
    let mut groups: BTreeMap<&'a str, Vec<&'a Ping>> = BTreeMap::new();
    for ping in pings {
        groups.entry(ping.trip_code.as_str()).or_default().push(ping);
    }
    groups
}

/// Distinct rider ids per trip across the full, unfiltered history.
pub fn unique_riders_by_trip(pings: &[Ping]) -> HashMap<&str, usize> {
    let mut riders: HashMap<&str, HashSet<&str>> = HashMap::new();
    for ping in pings {
        riders
            .entry(ping.trip_code.as_str())
            .or_default()
            .insert(ping.rider_id.as_str());
    }
    riders
        .into_iter()
        .map(|(trip, ids)| (trip, ids.len()))
        .collect()
}
