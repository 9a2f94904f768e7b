// armopt_simulator/src/dynamics.rs
//! Recursive Newton–Euler inverse dynamics for the lumped-mass arm model.
//!
//! Each link is a point mass at the midpoint between its joint origins, with an
//! isotropic rotational inertia of a slender rod of the link's length. The
//! formulation works directly in the world frame.

use nalgebra::{Isometry3, Vector3};

use crate::arm::ArmModel;

/// Floor on the rod length used for the rotational inertia (m).
const MIN_INERTIA_LENGTH: f64 = 0.05;

/// Joint torques required for `(q, qd, qdd)` under `gravity`.
///
/// All slices must have `model.num_joints()` entries; the caller validates.
pub fn inverse_dynamics(
    model: &ArmModel,
    q: &[f64],
    qd: &[f64],
    qdd: &[f64],
    gravity: &Vector3<f64>,
) -> Vec<f64> {
    let n = model.num_joints();
    let frames = model.link_frames(&Isometry3::identity(), q);

    let mut axes = Vec::with_capacity(n);
    let mut spans = Vec::with_capacity(n);
    let mut forces = Vec::with_capacity(n);
    let mut moments = Vec::with_capacity(n);

    // Forward pass: velocities and accelerations from the base outwards.
    // Gravity enters as an upward acceleration of the base.
    let mut omega = Vector3::zeros();
    let mut omega_dot = Vector3::zeros();
    let mut accel = -gravity;

    for i in 0..n {
        let z = frames[i].rotation * Vector3::z();
        let r = frames[i + 1].translation.vector - frames[i].translation.vector;
        let rc = r * 0.5;

        let omega_next = omega + z * qd[i];
        let omega_dot_next = omega_dot + z * qdd[i] + omega.cross(&z) * qd[i];

        let accel_com = accel + omega_dot_next.cross(&rc) + omega_next.cross(&omega_next.cross(&rc));
        let accel_end = accel + omega_dot_next.cross(&r) + omega_next.cross(&omega_next.cross(&r));

        let link = &model.links[i];
        let length = link.length().max(MIN_INERTIA_LENGTH);
        let inertia = link.mass * length * length / 12.0;

        forces.push(accel_com * link.mass);
        moments.push(omega_dot_next * inertia);
        axes.push(z);
        spans.push(r);

        omega = omega_next;
        omega_dot = omega_dot_next;
        accel = accel_end;
    }

    // Backward pass: wrench about each joint origin, projected on its axis.
    let mut torques = vec![0.0; n];
    let mut f_child = Vector3::zeros();
    let mut n_child = Vector3::zeros();
    for i in (0..n).rev() {
        let r = spans[i];
        let f = forces[i] + f_child;
        let moment = moments[i] + n_child + (r * 0.5).cross(&forces[i]) + r.cross(&f_child);
        torques[i] = moment.dot(&axes[i]) + model.links[i].armature * qdd[i];
        f_child = f;
        n_child = moment;
    }

    torques
}
