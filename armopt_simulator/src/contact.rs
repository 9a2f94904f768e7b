// armopt_simulator/src/contact.rs
//! Capsule-vs-sphere contact tests for the link chain.

use nalgebra::{Isometry3, Vector3};
use serde::{Deserialize, Serialize};

/// A static spherical obstacle in the world frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphereObstacle {
    pub center: [f64; 3],
    pub radius: f64,
}

impl SphereObstacle {
    pub fn new(center: [f64; 3], radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn center_vector(&self) -> Vector3<f64> {
        Vector3::new(self.center[0], self.center[1], self.center[2])
    }
}

/// Shortest distance from `p` to the segment `[a, b]`.
pub fn segment_point_distance(a: &Vector3<f64>, b: &Vector3<f64>, p: &Vector3<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < 1e-18 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// True when any link capsule of radius `link_radius` touches an obstacle,
/// or any joint origin above the base sinks below `ground_height`.
pub fn chain_in_contact(
    frames: &[Isometry3<f64>],
    link_radius: f64,
    obstacles: &[SphereObstacle],
    ground_height: Option<f64>,
) -> bool {
    for pair in frames.windows(2) {
        let a = pair[0].translation.vector;
        let b = pair[1].translation.vector;
        for obstacle in obstacles {
            let distance = segment_point_distance(&a, &b, &obstacle.center_vector());
            if distance < obstacle.radius + link_radius {
                return true;
            }
        }
    }

    if let Some(ground) = ground_height {
        if frames
            .iter()
            .skip(1)
            .any(|f| f.translation.vector.z - link_radius < ground)
        {
            return true;
        }
    }

    false
}
