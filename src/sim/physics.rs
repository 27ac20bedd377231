//! Fixed timestep integrator
//!
//! Semi-implicit Euler: velocity is updated from the forces first, then the
//! position is advanced with the new velocity.

use glam::{Quat, Vec3};

use super::state::{BallState, PhysicsParameters};

/// Gravity, drag and Magnus forces acting on the ball (N)
pub fn total_force(state: &BallState, params: &PhysicsParameters) -> Vec3 {
    let gravity = Vec3::NEG_Y * params.gravity * params.mass;

    let speed_sq = state.velocity.length_squared();
    let aero = 0.5 * params.air_density * params.cross_section() * speed_sq;

    // normalize_or_zero keeps both terms at zero for a ball at rest or without spin
    let drag = -state.velocity.normalize_or_zero() * params.drag_coefficient * aero;
    let magnus = state
        .spin
        .normalize_or_zero()
        .cross(state.velocity.normalize_or_zero())
        * params.lift_coefficient
        * aero;

    gravity + drag + magnus
}

/// Advance the ball state by one timestep
pub fn integrate_step(state: &mut BallState, params: &PhysicsParameters, dt: f32) {
    let force = total_force(state, params);
    state.velocity += force / params.mass * dt;

    state.spin *= params.spin_decay;

    state.position += state.velocity * dt;
    state.orientation = (state.orientation * Quat::from_scaled_axis(state.spin * dt)).normalize();
}
