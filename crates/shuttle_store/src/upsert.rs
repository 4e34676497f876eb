//! The single deduplication rule applied before the core reads any ping.
//!
//! One ping per `(trip_code, rider_id)`. An incoming ping replaces the stored
//! one when its timestamp is not older; the stored entry keeps its position in
//! list order so downstream iteration stays stable.

use std::collections::HashMap;

use shuttle_core::Ping;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
    /// The incoming ping is older than the stored one and was ignored.
    Stale,
}

/// Applies the latest-timestamp rule for one incoming ping.
pub fn upsert_latest(pings: &mut Vec<Ping>, incoming: Ping) -> UpsertOutcome {
    let existing = pings.iter_mut().find(|ping| {
        ping.trip_code == incoming.trip_code && ping.rider_id == incoming.rider_id
    });
    match existing {
        Some(stored) if incoming.timestamp >= stored.timestamp => {
            *stored = incoming;
            UpsertOutcome::Replaced
        }
        Some(_) => UpsertOutcome::Stale,
        None => {
            pings.push(incoming);
            UpsertOutcome::Inserted
        }
    }
}

/// Collapses a history to one ping per rider and trip, keeping first-seen order.
pub fn dedup_latest(pings: Vec<Ping>) -> Vec<Ping> {
    let mut slots: HashMap<(String, String), usize> = HashMap::with_capacity(pings.len());
    let mut latest: Vec<Ping> = Vec::with_capacity(pings.len());
    for ping in pings {
        let key = (ping.trip_code.clone(), ping.rider_id.clone());
        match slots.get(&key) {
            Some(&slot) => {
                if ping.timestamp >= latest[slot].timestamp {
                    latest[slot] = ping;
                }
            }
            None => {
                slots.insert(key, latest.len());
                latest.push(ping);
            }
        }
    }
    latest
}
