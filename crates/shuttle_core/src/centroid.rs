use crate::geo::GeoPoint;
use crate::model::Ping;

/// Accuracy-weighted center of a cluster's members.
///
/// Each ping weighs `1 / max(accuracy, 1m)`. When the total weight is not
/// usable the unweighted mean of the valid points is returned instead.
/// Returns `None` only when no member has a valid position.
pub fn weighted_centroid<'a, I>(members: I) -> Option<GeoPoint>
where
    I: IntoIterator<Item = &'a Ping>,
{
    let valid: Vec<&Ping> = members
        .into_iter()
        .filter(|ping| ping.has_valid_position())
        .collect();
    if valid.is_empty() {
        return None;
    }

    let (mut lat_sum, mut lng_sum, mut weight_sum) = (0.0, 0.0, 0.0);
    for ping in &valid {
        let weight = ping.centroid_weight();
        lat_sum += ping.lat * weight;
        lng_sum += ping.lng * weight;
        weight_sum += weight;
    }

    if weight_sum > 0.0 && weight_sum.is_finite() {
        return Some(GeoPoint::new(lat_sum / weight_sum, lng_sum / weight_sum));
    }

    tracing::debug!(
        members = valid.len(),
        "centroid weights unusable, using unweighted mean"
    );
    Some(mean_position(&valid))
}

fn mean_position(pings: &[&Ping]) -> GeoPoint {
    let count = pings.len() as f64;
    let lat = pings.iter().map(|ping| ping.lat).sum::<f64>() / count;
    let lng = pings.iter().map(|ping| ping.lng).sum::<f64>() / count;
    GeoPoint::new(lat, lng)
}
