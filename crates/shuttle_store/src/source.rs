use serde::Serialize;
use sha2::{Digest, Sha256};
use shuttle_core::{Ping, Trip};

use crate::error::StoreError;

/// One consistent read of the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub trips: Vec<Trip>,
    pub pings: Vec<Ping>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty() && self.pings.is_empty()
    }

    /// SHA-256 over the snapshot's JSON form; equal snapshots share a fingerprint.
    pub fn fingerprint(&self) -> Result<String, StoreError> {
        let body = serde_json::to_vec(self)
            .map_err(|error| StoreError::encode("snapshot fingerprint", error))?;
        let mut hasher = Sha256::new();
        hasher.update(body);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Read side of the ping/trip store.
///
/// Implementations hand out pings already deduplicated to the latest
/// timestamp per rider and trip, and only well-formed records.
pub trait SnapshotSource: Send + Sync {
    fn list_pings(&self) -> Result<Vec<Ping>, StoreError>;

    fn list_trips(&self) -> Result<Vec<Trip>, StoreError>;

    /// Both collections from a single read where the backend allows it.
    fn snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(Snapshot {
            trips: self.list_trips()?,
            pings: self.list_pings()?,
        })
    }
}
