//! Shuttle position and trip liveness from rider location pings.
//!
//! Two pure computations over one immutable snapshot of pings and trips:
//!
//! - [`compute_clusters`]: per trip, the dominant density-based grouping of
//!   recent rider pings, with an accuracy-weighted center.
//! - [`compute_health`]: per trip, a liveness tier from the age of the most
//!   recent ping.
//!
//! Both take `now` explicitly and perform no I/O. Acquiring the snapshot is the
//! caller's job (see the `shuttle_store` crate).
//!
//! # Modules
//!
//! - [`geo`]: coordinates and Haversine distance
//! - [`recency`]: freshness filter and per-trip grouping
//! - [`clustering`]: the cluster engine
//! - [`centroid`]: accuracy-weighted centers
//! - [`assemble`]: per-trip cluster records
//! - [`health`]: liveness tiers

pub mod assemble;
pub mod centroid;
pub mod clustering;
pub mod geo;
pub mod health;
pub mod model;
pub mod params;
pub mod recency;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use assemble::compute_clusters;
pub use clustering::{ClusterEngine, PointCluster};
pub use geo::{haversine_m, GeoPoint};
pub use health::compute_health;
pub use model::{Cluster, HealthStatus, HealthTier, Ping, Trip};
pub use params::{ClusterParams, HealthThresholds};
