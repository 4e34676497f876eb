//! Per-trip cluster computation and result assembly.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use rayon::prelude::*;

use crate::centroid::weighted_centroid;
use crate::clustering::ClusterEngine;
use crate::geo::GeoPoint;
use crate::model::{Cluster, Ping, Trip};
use crate::params::ClusterParams;
use crate::recency::{group_by_trip, recent_pings, unique_riders_by_trip};

/// Computes the dominant cluster of every registered trip.
///
/// Trips with fewer than `min_points` recent pings, or whose recent pings are
/// all noise, are absent from the result. Pings for unregistered trip codes
/// are ignored. Trips are processed in parallel; the result does not depend
/// on scheduling.
pub fn compute_clusters(
    pings: &[Ping],
    trips: &[Trip],
    now: DateTime<Utc>,
    params: &ClusterParams,
) -> BTreeMap<String, Cluster> {
    let registered: HashSet<&str> = trips.iter().map(|trip| trip.code.as_str()).collect();
    if registered.is_empty() || pings.is_empty() {
        return BTreeMap::new();
    }

    let recent = recent_pings(pings, now, params.recency_window());
    let grouped = group_by_trip(
        recent
            .into_iter()
            .filter(|ping| registered.contains(ping.trip_code.as_str())),
    );
    let totals = unique_riders_by_trip(pings);
    let engine = ClusterEngine::from_params(params);

    let groups: Vec<(&str, Vec<&Ping>)> = grouped.into_iter().collect();
    groups
        .par_iter()
        .filter_map(|(trip_code, members)| {
            let total_riders = totals.get(trip_code).copied().unwrap_or(0);
            cluster_trip(&engine, trip_code, members, total_riders, now)
                .map(|cluster| (trip_code.to_string(), cluster))
        })
        .collect()
}

/// Runs the engine over one trip's recent pings and assembles the winner.
pub fn cluster_trip(
    engine: &ClusterEngine,
    trip_code: &str,
    recent: &[&Ping],
    total_riders: usize,
    now: DateTime<Utc>,
) -> Option<Cluster> {
    if recent.len() < engine.min_points() {
        tracing::debug!(
            trip_code,
            recent = recent.len(),
            min_points = engine.min_points(),
            "not enough recent pings to cluster"
        );
        return None;
    }

    let points: Vec<GeoPoint> = recent.iter().map(|ping| ping.position()).collect();
    let Some(winner) = engine.dominant_cluster(&points) else {
        tracing::debug!(trip_code, recent = recent.len(), "all recent pings are noise");
        return None;
    };

    let members: Vec<&Ping> = winner.members.iter().map(|&index| recent[index]).collect();
    assemble_cluster(trip_code, &members, total_riders, now)
}

/// Packages a winning cluster's members into the output record.
///
/// `total_riders` is the distinct rider count over the trip's full history.
pub fn assemble_cluster(
    trip_code: &str,
    members: &[&Ping],
    total_riders: usize,
    now: DateTime<Utc>,
) -> Option<Cluster> {
    let Some(center) = weighted_centroid(members.iter().copied()) else {
        tracing::warn!(trip_code, "cluster has no valid positions, omitting");
        return None;
    };

    let rider_count = members.len();
    // Only exceeded when the source skipped per-rider deduplication.
    let total_riders = total_riders.max(rider_count);
    let strength = (rider_count as f64 / total_riders as f64).clamp(0.0, 1.0);

    Some(Cluster {
        trip_code: trip_code.to_string(),
        center,
        strength,
        rider_count,
        total_riders,
        computed_at: now,
        rider_ids: members.iter().map(|ping| ping.rider_id.clone()).collect(),
    })
}
