//! Periodic recomputation against a live store.
//!
//! Each tick takes one snapshot off the async runtime, computes a report at
//! the clock's current instant and hands it to a sink. Read failures are
//! logged and the loop keeps going.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use shuttle_store::SnapshotSource;
use tokio::time::MissedTickBehavior;

use crate::config::EngineConfig;
use crate::report::SnapshotReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Emit a report on every tick.
    Always,
    /// Emit only when the snapshot differs from the last one reported.
    OnStoreChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub interval: Duration,
    pub trigger: RefreshTrigger,
    /// Stop after this many ticks; `None` runs until shutdown.
    pub max_ticks: Option<u64>,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            trigger: RefreshTrigger::Always,
            max_ticks: None,
        }
    }
}

impl RefreshPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_trigger(mut self, trigger: RefreshTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub ticks: u64,
    pub reports: u64,
    pub unchanged: u64,
    pub failures: u64,
}

pub async fn run_refresh_loop<S, C, F, Sd>(
    source: Arc<S>,
    config: EngineConfig,
    policy: RefreshPolicy,
    clock: C,
    mut sink: F,
    shutdown: Sd,
) -> RefreshSummary
where
    S: SnapshotSource + ?Sized + 'static,
    C: Fn() -> DateTime<Utc>,
    F: FnMut(SnapshotReport),
    Sd: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(policy.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut summary = RefreshSummary::default();
    let mut last_fingerprint: Option<String> = None;

    loop {
        if policy.max_ticks.is_some_and(|max| summary.ticks >= max) {
            break;
        }
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!(ticks = summary.ticks, "refresh loop shutting down");
                break;
            }
            _ = ticker.tick() => {}
        }
        summary.ticks += 1;

        let reader = Arc::clone(&source);
        let snapshot = match tokio::task::spawn_blocking(move || reader.snapshot()).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(error)) => {
                tracing::warn!(tick = summary.ticks, %error, "snapshot read failed");
                summary.failures += 1;
                continue;
            }
            Err(error) => {
                tracing::error!(tick = summary.ticks, %error, "snapshot read task failed");
                summary.failures += 1;
                continue;
            }
        };

        if policy.trigger == RefreshTrigger::OnStoreChange {
            match snapshot.fingerprint() {
                Ok(fingerprint) if last_fingerprint.as_deref() == Some(fingerprint.as_str()) => {
                    summary.unchanged += 1;
                    continue;
                }
                Ok(fingerprint) => last_fingerprint = Some(fingerprint),
                Err(error) => {
                    tracing::warn!(tick = summary.ticks, %error, "could not fingerprint snapshot");
                    last_fingerprint = None;
                }
            }
        }

        let report = SnapshotReport::from_snapshot(&snapshot, &config, clock());
        tracing::debug!(
            tick = summary.ticks,
            clusters = report.clusters.len(),
            trips = report.health.len(),
            "refresh produced report"
        );
        sink(report);
        summary.reports += 1;
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use shuttle_core::test_helpers::{fixed_now, ping_secs_ago, trip};
    use shuttle_core::{Ping, Trip};
    use shuttle_store::{MemoryStore, Snapshot, StoreError};

    fn fast_policy(trigger: RefreshTrigger, ticks: u64) -> RefreshPolicy {
        RefreshPolicy::default()
            .with_interval(Duration::from_millis(5))
            .with_trigger(trigger)
            .with_max_ticks(ticks)
    }

    fn seeded_store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_records(
            vec![trip("T1")],
            vec![ping_secs_ago("T1", "R1", 6.5244, 3.3792, 30)],
        ))
    }

    #[tokio::test]
    async fn always_trigger_reports_every_tick() {
        let mut reports = Vec::new();
        let summary = run_refresh_loop(
            seeded_store(),
            EngineConfig::default(),
            fast_policy(RefreshTrigger::Always, 3),
            fixed_now,
            |report| reports.push(report),
            std::future::pending(),
        )
        .await;

        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.reports, 3);
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|report| report.generated_at == fixed_now()));
    }

    #[tokio::test]
    async fn change_trigger_skips_identical_snapshots() {
        let store = seeded_store();
        let writer = Arc::clone(&store);
        let mut seen = 0;
        let summary = run_refresh_loop(
            store,
            EngineConfig::default(),
            fast_policy(RefreshTrigger::OnStoreChange, 4),
            fixed_now,
            |_report| {
                seen += 1;
                if seen == 1 {
                    writer
                        .record_ping(ping_secs_ago("T1", "R2", 6.5245, 3.3793, 5))
                        .expect("ping");
                }
            },
            std::future::pending(),
        )
        .await;

        assert_eq!(summary.ticks, 4);
        assert_eq!(summary.reports, 2);
        assert_eq!(summary.unchanged, 2);
    }

    #[tokio::test]
    async fn shutdown_stops_before_the_first_tick() {
        let mut reports = 0;
        let summary = run_refresh_loop(
            seeded_store(),
            EngineConfig::default(),
            RefreshPolicy::default(),
            fixed_now,
            |_report| reports += 1,
            std::future::ready(()),
        )
        .await;

        assert_eq!(summary, RefreshSummary::default());
        assert_eq!(reports, 0);
    }

    struct BrokenSource;

    impl SnapshotSource for BrokenSource {
        fn list_pings(&self) -> Result<Vec<Ping>, StoreError> {
            Err(StoreError::Io("disk unplugged".to_string()))
        }

        fn list_trips(&self) -> Result<Vec<Trip>, StoreError> {
            Err(StoreError::Io("disk unplugged".to_string()))
        }

        fn snapshot(&self) -> Result<Snapshot, StoreError> {
            Err(StoreError::Io("disk unplugged".to_string()))
        }
    }

    #[tokio::test]
    async fn read_failures_do_not_stop_the_loop() {
        let mut reports = 0;
        let summary = run_refresh_loop(
            Arc::new(BrokenSource),
            EngineConfig::default(),
            fast_policy(RefreshTrigger::Always, 3),
            fixed_now,
            |_report| reports += 1,
            std::future::pending(),
        )
        .await;

        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.failures, 3);
        assert_eq!(summary.reports, 0);
        assert_eq!(reports, 0);
    }
}
