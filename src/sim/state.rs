//! Ball state and physics parameters
//!
//! Everything the integrator mutates lives in `BallState`; everything it only
//! reads lives in `PhysicsParameters`.

use glam::{Quat, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// The random source used by the simulation (grid noise, random shots)
pub type SimRng = Pcg32;

/// Create a simulation RNG from a seed
pub fn seeded_rng(seed: u64) -> SimRng {
    Pcg32::seed_from_u64(seed)
}

/// Rigid-sphere state advanced by the integrator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallState {
    /// Centre position (meters)
    pub position: Vec3,
    /// Linear velocity (m/s)
    pub velocity: Vec3,
    /// Angular velocity (rad/s)
    pub spin: Vec3,
    /// Unit orientation quaternion
    pub orientation: Quat,
}

impl Default for BallState {
    fn default() -> Self {
        Self::at_rest(Vec3::ZERO)
    }
}

impl BallState {
    pub fn new(position: Vec3, velocity: Vec3, spin: Vec3) -> Self {
        Self {
            position,
            velocity,
            spin,
            orientation: Quat::IDENTITY,
        }
    }

    pub fn at_rest(position: Vec3) -> Self {
        Self::new(position, Vec3::ZERO, Vec3::ZERO)
    }

    /// Current speed (m/s)
    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Immutable physical constants of the ball and the air
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParameters {
    /// Ball mass (kg)
    pub mass: f32,
    /// Gravity magnitude (m/s²)
    pub gravity: f32,
    /// Quadratic drag coefficient
    pub drag_coefficient: f32,
    /// Magnus lift coefficient
    pub lift_coefficient: f32,
    /// Air density (kg/m³)
    pub air_density: f32,
    /// Tangential friction applied to spin on contact
    pub friction_coefficient: f32,
    /// Multiplicative spin decay applied every step
    pub spin_decay: f32,
    /// Velocity scale applied on every contact
    pub restitution: f32,
    /// Ball radius (m)
    pub radius: f32,
}

impl Default for PhysicsParameters {
    fn default() -> Self {
        Self {
            mass: 0.057,
            gravity: 9.81,
            drag_coefficient: 0.5,
            lift_coefficient: 0.5,
            air_density: 1.2,
            friction_coefficient: 0.5,
            spin_decay: 0.9,
            restitution: 0.8,
            radius: 0.0335,
        }
    }
}

impl PhysicsParameters {
    /// Parameters with drag and lift disabled (vacuum flight)
    pub fn vacuum() -> Self {
        Self {
            drag_coefficient: 0.0,
            lift_coefficient: 0.0,
            ..Self::default()
        }
    }

    /// Ball cross-section area π r²
    #[inline]
    pub fn cross_section(&self) -> f32 {
        std::f32::consts::PI * self.radius * self.radius
    }
}
