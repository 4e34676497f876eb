#![allow(dead_code)]

use shuttle_core::test_helpers::{fixed_now, offset_m, ping_secs_ago};
use shuttle_core::GeoPoint;
use shuttle_store::JsonFileStore;
use tempfile::TempDir;

pub fn pickup_point() -> GeoPoint {
    GeoPoint::new(6.52445, 3.37925)
}

/// File store with trip `T1` (four riders together, one far away) and an
/// empty trip `T2`.
pub fn seeded_file_store(dir: &TempDir) -> JsonFileStore {
    let store = JsonFileStore::new(dir.path().join("store.json"));
    store.register_trip(Some("T1"), fixed_now()).expect("trip T1");
    store.register_trip(Some("T2"), fixed_now()).expect("trip T2");

    let origin = pickup_point();
    for (index, (north, east)) in [(0.0, 0.0), (40.0, 10.0), (-30.0, 25.0), (15.0, -35.0)]
        .into_iter()
        .enumerate()
    {
        let at = offset_m(origin, north, east);
        store
            .record_ping(ping_secs_ago("T1", &format!("R{index}"), at.lat, at.lng, 20 + index as i64))
            .expect("ping");
    }
    let far = offset_m(origin, 5_000.0, 0.0);
    store
        .record_ping(ping_secs_ago("T1", "R9", far.lat, far.lng, 30))
        .expect("far ping");
    store
}
