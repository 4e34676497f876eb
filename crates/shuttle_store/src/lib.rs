//! Ping and trip store feeding the shuttle core.
//!
//! Owns everything the pure computations in `shuttle_core` assume has already
//! happened: ad hoc JSON entries are validated into typed records at this
//! boundary, and each rider's location is reduced to its latest ping per trip
//! by one rule ([`upsert`]) before any read.

pub mod codes;
pub mod error;
pub mod file;
mod ledger;
pub mod memory;
pub mod record;
pub mod source;
pub mod upsert;

pub use error::{StoreError, ValidationError};
pub use file::{default_store_path, JsonFileStore, DEFAULT_STORE_FILE_NAME, STORE_FILE_VERSION};
pub use memory::MemoryStore;
pub use source::{Snapshot, SnapshotSource};
pub use upsert::UpsertOutcome;
