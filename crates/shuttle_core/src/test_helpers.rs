//! Test helpers for building pings, trips and synthetic rider scatters.
//!
//! Shared by unit tests, integration tests and benchmarks.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geo::GeoPoint;
use crate::model::{Ping, Trip};

/// Meters per degree of latitude on the mean-radius sphere.
const METERS_PER_DEGREE: f64 = 111_195.0;

/// A fixed evaluation instant used across tests.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0)
        .single()
        .expect("fixed_now should be a valid instant")
}

/// A ping stamped `secs_ago` seconds before [`fixed_now`] (negative = in the future).
pub fn ping_secs_ago(trip_code: &str, rider_id: &str, lat: f64, lng: f64, secs_ago: i64) -> Ping {
    Ping::new(
        trip_code,
        rider_id,
        fixed_now() - TimeDelta::seconds(secs_ago),
        lat,
        lng,
    )
}

/// A trip registered one hour before [`fixed_now`].
pub fn trip(code: &str) -> Trip {
    Trip::new(code, fixed_now() - TimeDelta::hours(1))
}

/// Offsets `origin` by the given meters north and east.
pub fn offset_m(origin: GeoPoint, north_m: f64, east_m: f64) -> GeoPoint {
    let lat = origin.lat + north_m / METERS_PER_DEGREE;
    let lng = origin.lng + east_m / (METERS_PER_DEGREE * origin.lat.to_radians().cos());
    GeoPoint::new(lat, lng)
}

/// Seeded generator of riders scattered around a center point.
#[derive(Debug, Clone)]
pub struct SyntheticPings {
    pub trip_code: String,
    pub center: GeoPoint,
    /// Maximum offset from the center along each axis, in meters.
    pub spread_m: f64,
    /// Maximum ping age in seconds.
    pub max_age_secs: i64,
    pub seed: u64,
}

impl SyntheticPings {
    pub fn new(trip_code: &str, center: GeoPoint) -> Self {
        Self {
            trip_code: trip_code.to_string(),
            center,
            spread_m: 200.0,
            max_age_secs: 60,
            seed: 42,
        }
    }

    pub fn with_spread_m(mut self, spread_m: f64) -> Self {
        self.spread_m = spread_m;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// `count` pings from distinct riders `"{prefix}-{i}"`.
    pub fn generate(&self, prefix: &str, count: usize) -> Vec<Ping> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..count)
            .map(|i| {
                let north = rng.gen_range(-self.spread_m..=self.spread_m);
                let east = rng.gen_range(-self.spread_m..=self.spread_m);
                let age = rng.gen_range(0..=self.max_age_secs);
                let accuracy = rng.gen_range(3.0..=60.0);
                let position = offset_m(self.center, north, east);
                ping_secs_ago(
                    &self.trip_code,
                    &format!("{prefix}-{i}"),
                    position.lat,
                    position.lng,
                    age,
                )
                .with_accuracy(accuracy)
            })
            .collect()
    }
}
