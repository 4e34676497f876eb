//! Versioned JSON flat-file store.
//!
//! Layout: `{"version": 1, "trips": [...], "pings": [...]}`. Entries are kept
//! as raw JSON on disk and validated one by one on load; malformed entries are
//! logged and skipped. Writes go to a temp file that is renamed into place.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shuttle_core::{Ping, Trip};

use crate::error::StoreError;
use crate::ledger;
use crate::record::{ping_from_value, trip_from_value, PingRecord, TripRecord};
use crate::source::{Snapshot, SnapshotSource};
use crate::upsert::{dedup_latest, UpsertOutcome};

pub const STORE_FILE_VERSION: u32 = 1;
pub const DEFAULT_STORE_FILE_NAME: &str = "shuttle_store.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFileV1 {
    version: u32,
    #[serde(default)]
    trips: Vec<Value>,
    #[serde(default)]
    pings: Vec<Value>,
}

impl StoreFileV1 {
    fn from_snapshot(snapshot: &Snapshot) -> Result<Self, StoreError> {
        let trips = snapshot
            .trips
            .iter()
            .map(|trip| serde_json::to_value(TripRecord::from(trip)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| StoreError::encode("trip records", error))?;
        let pings = snapshot
            .pings
            .iter()
            .map(|ping| serde_json::to_value(PingRecord::from(ping)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| StoreError::encode("ping records", error))?;
        Ok(Self {
            version: STORE_FILE_VERSION,
            trips,
            pings,
        })
    }

    fn into_snapshot(self, path: &Path) -> Snapshot {
        let mut trips: Vec<Trip> = Vec::with_capacity(self.trips.len());
        for (index, value) in self.trips.into_iter().enumerate() {
            match trip_from_value(value) {
                Ok(trip) if trips.iter().any(|known| known.code == trip.code) => {
                    tracing::warn!(path = %path.display(), index, trip_code = %trip.code, "skipping duplicate trip entry");
                }
                Ok(trip) => trips.push(trip),
                Err(error) => {
                    tracing::warn!(path = %path.display(), index, %error, "skipping malformed trip entry");
                }
            }
        }

        let mut pings: Vec<Ping> = Vec::with_capacity(self.pings.len());
        for (index, value) in self.pings.into_iter().enumerate() {
            match ping_from_value(value) {
                Ok(ping) => pings.push(ping),
                Err(error) => {
                    tracing::warn!(path = %path.display(), index, %error, "skipping malformed ping entry");
                }
            }
        }

        Snapshot {
            trips,
            pings: dedup_latest(pings),
        }
    }
}

pub fn default_store_path() -> Result<PathBuf, StoreError> {
    let cwd = std::env::current_dir()
        .map_err(|error| StoreError::Io(format!("failed to read current directory: {error}")))?;
    Ok(cwd.join(DEFAULT_STORE_FILE_NAME))
}

/// Reads and validates the store file. A missing file is an empty store.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Snapshot::default()),
        Err(error) => return Err(io_error("read store file", path, error)),
    };

    let file: StoreFileV1 = serde_json::from_str(&contents).map_err(|error| {
        StoreError::InvalidFormat(format!("invalid store file '{}': {error}", path.display()))
    })?;

    if file.version != STORE_FILE_VERSION {
        return Err(StoreError::InvalidFormat(format!(
            "unsupported store file version {} in '{}'",
            file.version,
            path.display()
        )));
    }

    Ok(file.into_snapshot(path))
}

fn io_error(action: &str, path: &Path, error: io::Error) -> StoreError {
    StoreError::Io(format!("failed to {action} '{}': {error}", path.display()))
}

/// Sibling of `path` unique to this process and instant.
fn temp_path_for(path: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or(0);
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from(DEFAULT_STORE_FILE_NAME));
    name.push(format!(".{}.{nanos}.tmp", std::process::id()));
    path.with_file_name(name)
}

fn write_synced(path: &Path, body: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(body)?;
    file.sync_all()
}

/// Renames `temp` over `target`, removing `target` first on platforms where
/// rename does not overwrite. The temp file is cleaned up on failure.
fn move_into_place(temp: &Path, target: &Path) -> Result<(), StoreError> {
    fs::rename(temp, target)
        .or_else(|first_error| {
            if !target.exists() {
                return Err(first_error);
            }
            fs::remove_file(target)?;
            fs::rename(temp, target)
        })
        .map_err(|error| {
            let _ = fs::remove_file(temp);
            io_error("replace store file", target, error)
        })
}

/// Writes the snapshot to a temp file, syncs it, then moves it over `path`.
pub fn save_snapshot_atomic(path: &Path, snapshot: &Snapshot) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|error| io_error("create store directory", parent, error))?;
    }

    let body = serde_json::to_vec_pretty(&StoreFileV1::from_snapshot(snapshot)?)
        .map_err(|error| StoreError::encode("store file", error))?;

    let temp_path = temp_path_for(path);
    if let Err(error) = write_synced(&temp_path, &body) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error("write temp store file", &temp_path, error));
    }
    move_into_place(&temp_path, path)
}

/// Store backed by a single JSON file. Every operation re-reads the file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn register_trip(
        &self,
        code: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<Trip, StoreError> {
        let mut snapshot = load_snapshot(&self.path)?;
        let trip = ledger::register_trip(&mut snapshot, code, created_at)?;
        save_snapshot_atomic(&self.path, &snapshot)?;
        Ok(trip)
    }

    pub fn record_ping(&self, ping: Ping) -> Result<UpsertOutcome, StoreError> {
        let mut snapshot = load_snapshot(&self.path)?;
        let outcome = ledger::record_ping(&mut snapshot, ping)?;
        if outcome != UpsertOutcome::Stale {
            save_snapshot_atomic(&self.path, &snapshot)?;
        }
        Ok(outcome)
    }
}

impl SnapshotSource for JsonFileStore {
    fn list_pings(&self) -> Result<Vec<Ping>, StoreError> {
        Ok(load_snapshot(&self.path)?.pings)
    }

    fn list_trips(&self) -> Result<Vec<Trip>, StoreError> {
        Ok(load_snapshot(&self.path)?.trips)
    }

    fn snapshot(&self) -> Result<Snapshot, StoreError> {
        load_snapshot(&self.path)
    }
}
