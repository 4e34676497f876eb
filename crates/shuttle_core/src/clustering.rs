//! Density-based grouping of one trip's recent pings.
//!
//! The engine compares every pair of points (no spatial index) and grows
//! clusters breadth-first from core points:
//!
//! - A point is a **core point** when it has at least `min_points - 1`
//!   neighbors within `radius_m`.
//! - Points are scanned in input order. The first unassigned core point seeds
//!   a new cluster; its unassigned neighbors are queued FIFO. Each dequeued
//!   point joins the cluster and, if it is itself a core point, queues its own
//!   unassigned neighbors. Border points never expand.
//! - Points never absorbed by a cluster are noise.
//!
//! The dominant cluster is the one with the most members. Equal sizes are
//! resolved in favor of the cluster whose seed appears earliest in the input.

use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::geo::{haversine_m, GeoPoint};
use crate::params::ClusterParams;

/// A cluster expressed as indices into the engine's input slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointCluster {
    /// Index of the core point that started the cluster.
    pub seed: usize,
    /// Member indices in discovery order (seed first).
    pub members: Vec<usize>,
}

impl PointCluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Larger clusters win; on equal size the earlier seed wins.
fn dominance(a: &PointCluster, b: &PointCluster) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| b.seed.cmp(&a.seed))
}

#[derive(Debug, Clone, Copy)]
pub struct ClusterEngine {
    radius_m: f64,
    min_points: usize,
}

impl ClusterEngine {
    pub fn new(radius_m: f64, min_points: usize) -> Self {
        Self {
            radius_m,
            min_points,
        }
    }

    pub fn from_params(params: &ClusterParams) -> Self {
        Self::new(params.radius_m, params.min_points)
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }

    /// Neighbor lists (other points within the radius). Each list is ascending
    /// because `i` grows monotonically in the outer loop.
    fn neighbor_lists(&self, points: &[GeoPoint]) -> Vec<Vec<usize>> {
        let n = points.len();
        let mut neighbors = vec![Vec::new(); n];
        for i in 0..n {
            for j in (i + 1)..n {
                if haversine_m(points[i], points[j]) <= self.radius_m {
                    neighbors[i].push(j);
                    neighbors[j].push(i);
                }
            }
        }
        neighbors
    }

    fn is_core(&self, neighbor_count: usize) -> bool {
        neighbor_count + 1 >= self.min_points
    }

    /// All disjoint clusters in discovery order.
    pub fn find_clusters(&self, points: &[GeoPoint]) -> Vec<PointCluster> {
        if points.is_empty() || points.len() < self.min_points {
            return Vec::new();
        }

        let neighbors = self.neighbor_lists(points);
        let mut assigned = vec![false; points.len()];
        let mut clusters = Vec::new();

        for seed in 0..points.len() {
            if assigned[seed] || !self.is_core(neighbors[seed].len()) {
                continue;
            }

            assigned[seed] = true;
            let mut members = vec![seed];
            let mut queue: VecDeque<usize> = VecDeque::new();
            for &neighbor in &neighbors[seed] {
                if !assigned[neighbor] {
                    assigned[neighbor] = true;
                    queue.push_back(neighbor);
                }
            }

            while let Some(current) = queue.pop_front() {
                members.push(current);
                if !self.is_core(neighbors[current].len()) {
                    continue;
                }
                for &neighbor in &neighbors[current] {
                    if !assigned[neighbor] {
                        assigned[neighbor] = true;
                        queue.push_back(neighbor);
                    }
                }
            }

            clusters.push(PointCluster { seed, members });
        }

        clusters
    }

    /// The largest cluster, or `None` when every point is noise.
    pub fn dominant_cluster(&self, points: &[GeoPoint]) -> Option<PointCluster> {
        self.find_clusters(points)
            .into_iter()
            .max_by(dominance)
    }
}

impl Default for ClusterEngine {
    fn default() -> Self {
        Self::from_params(&ClusterParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Roughly `meters` north of `origin`.
    fn north_of(origin: GeoPoint, meters: f64) -> GeoPoint {
        GeoPoint::new(origin.lat + meters / 111_195.0, origin.lng)
    }

    fn origin() -> GeoPoint {
        GeoPoint::new(6.5244, 3.3792)
    }

    #[test]
    fn fewer_points_than_min_points_yields_nothing() {
        let engine = ClusterEngine::new(1_000.0, 3);
        assert!(engine.find_clusters(&[origin(), origin()]).is_empty());
    }

    #[test]
    fn two_close_points_form_one_cluster() {
        let engine = ClusterEngine::default();
        let clusters = engine.find_clusters(&[origin(), north_of(origin(), 100.0)]);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members, vec![0, 1]);
    }

    #[test]
    fn far_apart_points_are_noise() {
        let engine = ClusterEngine::default();
        let points = [origin(), north_of(origin(), 5_000.0)];
        assert!(engine.dominant_cluster(&points).is_none());
    }

    #[test]
    fn chain_of_core_points_expands_transitively() {
        let engine = ClusterEngine::default();
        let points: Vec<GeoPoint> = (0..5)
            .map(|i| north_of(origin(), i as f64 * 900.0))
            .collect();
        let cluster = engine.dominant_cluster(&points).expect("cluster");
        assert_eq!(cluster.members, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn border_points_do_not_expand() {
        let engine = ClusterEngine::new(1_000.0, 4);
        let points = [
            origin(),
            north_of(origin(), 100.0),
            north_of(origin(), 200.0),
            north_of(origin(), 300.0),
            // Border: neighbors are 3 and 5 only.
            north_of(origin(), 1_250.0),
            // Reachable from the border point alone.
            north_of(origin(), 2_200.0),
        ];
        let cluster = engine.dominant_cluster(&points).expect("cluster");
        assert_eq!(cluster.members, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn discovery_order_is_breadth_first_from_seed() {
        let engine = ClusterEngine::default();
        let points = [
            north_of(origin(), 1_800.0),
            origin(),
            north_of(origin(), 900.0),
        ];
        let cluster = engine.dominant_cluster(&points).expect("cluster");
        assert_eq!(cluster.seed, 0);
        assert_eq!(cluster.members, vec![0, 2, 1]);
    }

    #[test]
    fn largest_cluster_wins() {
        let engine = ClusterEngine::default();
        let far = north_of(origin(), 50_000.0);
        let points = [
            origin(),
            north_of(origin(), 10.0),
            far,
            north_of(far, 10.0),
            north_of(far, 20.0),
        ];
        let cluster = engine.dominant_cluster(&points).expect("cluster");
        assert_eq!(cluster.members, vec![2, 3, 4]);
    }

    #[test]
    fn equal_size_tie_goes_to_earliest_seed() {
        let engine = ClusterEngine::default();
        let far = north_of(origin(), 50_000.0);
        let points = [far, origin(), north_of(far, 10.0), north_of(origin(), 10.0)];
        let clusters = engine.find_clusters(&points);
        assert_eq!(clusters.len(), 2);
        let cluster = engine.dominant_cluster(&points).expect("cluster");
        assert_eq!(cluster.seed, 0);
        assert_eq!(cluster.members, vec![0, 2]);
    }

    #[test]
    fn min_points_of_one_makes_every_point_a_cluster() {
        let engine = ClusterEngine::new(1_000.0, 1);
        let points = [origin(), north_of(origin(), 10_000.0)];
        assert_eq!(engine.find_clusters(&points).len(), 2);
    }
}
