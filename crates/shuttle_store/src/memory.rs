use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use shuttle_core::{Ping, Trip};

use crate::error::StoreError;
use crate::ledger;
use crate::source::{Snapshot, SnapshotSource};
use crate::upsert::{dedup_latest, UpsertOutcome};

/// In-process store with the same write rules as the file store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a store from existing records, applying the deduplication rule.
    pub fn with_records(trips: Vec<Trip>, pings: Vec<Ping>) -> Self {
        Self {
            state: RwLock::new(Snapshot {
                trips,
                pings: dedup_latest(pings),
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Snapshot>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Io("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Snapshot>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Io("memory store lock poisoned".to_string()))
    }

    pub fn register_trip(
        &self,
        code: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<Trip, StoreError> {
        ledger::register_trip(&mut *self.write()?, code, created_at)
    }

    pub fn record_ping(&self, ping: Ping) -> Result<UpsertOutcome, StoreError> {
        ledger::record_ping(&mut *self.write()?, ping)
    }
}

impl SnapshotSource for MemoryStore {
    fn list_pings(&self) -> Result<Vec<Ping>, StoreError> {
        Ok(self.read()?.pings.clone())
    }

    fn list_trips(&self) -> Result<Vec<Trip>, StoreError> {
        Ok(self.read()?.trips.clone())
    }

    fn snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(self.read()?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shuttle_core::test_helpers::{fixed_now, ping_secs_ago, trip};

    #[test]
    fn seeded_records_are_deduplicated() {
        let store = MemoryStore::with_records(
            vec![trip("T1")],
            vec![
                ping_secs_ago("T1", "R1", 1.0, 1.0, 60),
                ping_secs_ago("T1", "R1", 2.0, 2.0, 5),
            ],
        );
        let pings = store.list_pings().expect("pings");
        assert_eq!(pings.len(), 1);
        assert_eq!(pings[0].lat, 2.0);
    }

    #[test]
    fn writes_are_visible_in_the_next_snapshot() {
        let store = MemoryStore::new();
        store.register_trip(Some("T1"), fixed_now()).expect("trip");
        store
            .record_ping(ping_secs_ago("T1", "R1", 1.0, 1.0, 0))
            .expect("ping");
        let snapshot = store.snapshot().expect("snapshot");
        assert_eq!(snapshot.trips.len(), 1);
        assert_eq!(snapshot.pings.len(), 1);
    }
}
