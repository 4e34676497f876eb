//! One consistent read of the store turned into clusters and health.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shuttle_core::{compute_clusters, compute_health, Cluster, HealthStatus};
use shuttle_store::{Snapshot, SnapshotSource};

use crate::config::EngineConfig;
use crate::error::ServiceError;

/// Clusters and health computed from the same snapshot at the same instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotReport {
    pub generated_at: DateTime<Utc>,
    pub clusters: BTreeMap<String, Cluster>,
    pub health: BTreeMap<String, HealthStatus>,
}

impl SnapshotReport {
    pub fn from_snapshot(snapshot: &Snapshot, config: &EngineConfig, now: DateTime<Utc>) -> Self {
        let clusters = compute_clusters(&snapshot.pings, &snapshot.trips, now, &config.cluster);
        let health = compute_health(&snapshot.pings, &snapshot.trips, now, &config.health);
        tracing::debug!(
            trips = snapshot.trips.len(),
            pings = snapshot.pings.len(),
            clusters = clusters.len(),
            "computed snapshot report"
        );
        Self {
            generated_at: now,
            clusters,
            health,
        }
    }
}

pub fn compute_report<S>(
    source: &S,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<SnapshotReport, ServiceError>
where
    S: SnapshotSource + ?Sized,
{
    let snapshot = source.snapshot()?;
    Ok(SnapshotReport::from_snapshot(&snapshot, config, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shuttle_core::test_helpers::{fixed_now, ping_secs_ago, trip};
    use shuttle_core::HealthTier;
    use shuttle_store::MemoryStore;

    #[test]
    fn report_uses_one_instant_for_both_views() {
        let store = MemoryStore::with_records(
            vec![trip("T1"), trip("T2")],
            vec![
                ping_secs_ago("T1", "R1", 6.5244, 3.3792, 10),
                ping_secs_ago("T1", "R2", 6.5245, 3.3793, 20),
            ],
        );
        let report =
            compute_report(&store, &EngineConfig::default(), fixed_now()).expect("report");

        assert_eq!(report.generated_at, fixed_now());
        assert_eq!(report.clusters["T1"].computed_at, fixed_now());
        assert!(!report.clusters.contains_key("T2"));
        assert_eq!(report.health["T1"].tier, HealthTier::Active);
        assert_eq!(report.health["T2"].tier, HealthTier::NoSignal);
    }

    #[test]
    fn report_serializes_with_camel_case_keys() {
        let report = SnapshotReport::from_snapshot(
            &Snapshot::default(),
            &EngineConfig::default(),
            fixed_now(),
        );
        let value = serde_json::to_value(&report).expect("json");
        assert_eq!(value["generatedAt"], "2024-05-01T08:30:00Z");
        assert!(value["clusters"].as_object().is_some_and(|map| map.is_empty()));
    }
}
