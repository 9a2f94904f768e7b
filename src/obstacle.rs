// src/obstacle.rs - Static obstacle point set and proximity penalty

use kiddo::{ImmutableKdTree, SquaredEuclidean};
use nalgebra::Vector3;

/// Default clearance below which samples are penalized (m)
pub const DEFAULT_SAFE_DIST: f64 = 0.03;

/// Obstacle points indexed for nearest-neighbour queries.
///
/// The index is built once from the full point set, so walls and grids with
/// many points sharing a coordinate are fine.
pub struct ObstacleField {
    points: Vec<[f64; 3]>,
    tree: Option<ImmutableKdTree<f64, 3>>,
}

impl ObstacleField {
    pub fn new(obstacles: &[[f64; 3]]) -> Self {
        let mut points: Vec<[f64; 3]> = Vec::with_capacity(obstacles.len());
        for p in obstacles {
            // Coincident points add nothing to the distance.
            if !points.contains(p) {
                points.push(*p);
            }
        }

        let tree = (!points.is_empty()).then(|| ImmutableKdTree::new_from_slice(&points));
        Self { points, tree }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Euclidean distance to the closest obstacle, `None` when there are none.
    pub fn nearest_distance(&self, point: &Vector3<f64>) -> Option<f64> {
        let tree = self.tree.as_ref()?;
        let nearest = tree.nearest_one::<SquaredEuclidean>(&[point.x, point.y, point.z]);
        Some(nearest.distance.sqrt())
    }

    /// Sum over samples of `max(0, safe_dist - d)²`.
    pub fn penalty(&self, positions: &[Vector3<f64>], safe_dist: f64) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        positions
            .iter()
            .filter_map(|p| self.nearest_distance(p))
            .map(|d| (safe_dist - d).max(0.0).powi(2))
            .sum()
    }
}

impl std::fmt::Debug for ObstacleField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObstacleField").field("points", &self.points).finish()
    }
}
