// armopt_simulator/src/arm.rs
//! Serial revolute arm described by standard Denavit–Hartenberg parameters.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// One revolute joint and the link it drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DhLink {
    /// Link length along x_i (m)
    pub a: f64,
    /// Link offset along z_{i-1} (m)
    pub d: f64,
    /// Link twist about x_i (rad)
    pub alpha: f64,
    /// Constant added to the joint angle (rad)
    #[serde(default)]
    pub theta_offset: f64,
    /// Lumped link mass (kg)
    #[serde(default = "default_mass")]
    pub mass: f64,
    /// Reflected rotor inertia seen at the joint (kg·m²)
    #[serde(default)]
    pub armature: f64,
}

fn default_mass() -> f64 {
    1.0
}

impl DhLink {
    pub fn new(a: f64, d: f64, alpha: f64, mass: f64) -> Self {
        Self {
            a,
            d,
            alpha,
            theta_offset: 0.0,
            mass,
            armature: 0.0,
        }
    }

    pub fn with_armature(mut self, armature: f64) -> Self {
        self.armature = armature;
        self
    }

    /// Homogeneous transform from frame i-1 to frame i: Rz(θ) Tz(d) Tx(a) Rx(α).
    pub fn transform(&self, angle: f64) -> Isometry3<f64> {
        let theta = angle + self.theta_offset;
        let about_z = Isometry3::from_parts(
            Translation3::new(0.0, 0.0, self.d),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), theta),
        );
        let about_x = Isometry3::from_parts(
            Translation3::new(self.a, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), self.alpha),
        );
        about_z * about_x
    }

    /// Straight-line distance spanned by the link.
    pub fn length(&self) -> f64 {
        (self.a * self.a + self.d * self.d).sqrt()
    }
}

/// Kinematic chain of the arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmModel {
    pub links: Vec<DhLink>,
}

impl ArmModel {
    pub fn new(links: Vec<DhLink>) -> Self {
        Self { links }
    }

    pub fn num_joints(&self) -> usize {
        self.links.len()
    }

    /// A 6-DOF industrial arm with UR5-like proportions.
    pub fn default_6dof() -> Self {
        Self::new(vec![
            DhLink::new(0.0, 0.089, FRAC_PI_2, 3.7).with_armature(0.05), // J1 base/shoulder
            DhLink::new(-0.425, 0.0, 0.0, 8.4).with_armature(0.05),      // J2 upper arm
            DhLink::new(-0.392, 0.0, 0.0, 2.3).with_armature(0.05),      // J3 forearm
            DhLink::new(0.0, 0.109, FRAC_PI_2, 1.2).with_armature(0.02), // J4 wrist 1
            DhLink::new(0.0, 0.095, -FRAC_PI_2, 1.2).with_armature(0.02), // J5 wrist 2
            DhLink::new(0.0, 0.082, 0.0, 0.25).with_armature(0.02),      // J6 flange
        ])
    }

    /// All frames from the base to the flange: `n + 1` isometries, the first
    /// being the base pose itself.
    pub fn link_frames(&self, base: &Isometry3<f64>, angles: &[f64]) -> Vec<Isometry3<f64>> {
        let mut frames = Vec::with_capacity(self.links.len() + 1);
        let mut t = *base;
        frames.push(t);
        for (link, &q) in self.links.iter().zip(angles.iter()) {
            t *= link.transform(q);
            frames.push(t);
        }
        frames
    }

    /// Flange pose in the world frame.
    pub fn forward_kinematics(&self, base: &Isometry3<f64>, angles: &[f64]) -> Isometry3<f64> {
        let mut t = *base;
        for (link, &q) in self.links.iter().zip(angles.iter()) {
            t *= link.transform(q);
        }
        t
    }
}
