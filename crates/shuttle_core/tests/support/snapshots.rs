use shuttle_core::test_helpers::{offset_m, ping_secs_ago, trip, SyntheticPings};
use shuttle_core::{GeoPoint, Ping, Trip};

/// Lagos Island, used as the default pickup area.
pub fn lagos() -> GeoPoint {
    GeoPoint::new(6.5244, 3.3792)
}

/// Pings for `count` riders within a few meters of `center`, all fresh.
pub fn huddle(trip_code: &str, prefix: &str, center: GeoPoint, count: usize) -> Vec<Ping> {
    (0..count)
        .map(|i| {
            let p = offset_m(center, i as f64 * 5.0, 0.0);
            ping_secs_ago(trip_code, &format!("{prefix}{i}"), p.lat, p.lng, 10).with_accuracy(10.0)
        })
        .collect()
}

/// Two registered trips: T1 has a tight group of 6 riders plus stragglers,
/// T2 has a scattered crowd of 20 riders.
pub fn busy_snapshot() -> (Vec<Ping>, Vec<Trip>) {
    let mut pings = huddle("T1", "a", lagos(), 6);
    let far = offset_m(lagos(), 20_000.0, 0.0);
    pings.push(ping_secs_ago("T1", "straggler", far.lat, far.lng, 30));
    pings.push(ping_secs_ago("T1", "old", lagos().lat, lagos().lng, 3_600));
    pings.extend(
        SyntheticPings::new("T2", offset_m(lagos(), 0.0, 8_000.0))
            .with_spread_m(600.0)
            .with_seed(11)
            .generate("b", 20),
    );
    (pings, vec![trip("T1"), trip("T2"), trip("T3")])
}
