//! Padel PathDB - ball trajectory simulator and trajectory retrieval database
//!
//! Core modules:
//! - `sim`: Deterministic simulation (integrator, collisions, legality checks)
//! - `pathdb`: K-d tree index, shot classification, corpus building, retrieval
//! - `persistence`: Save/load of the corpus and its indices
//! - `records`: Historical match data used to generate queries
//! - `situation`: Replaying historical rallies as validated shots
//! - `config`: Runtime configuration

pub mod config;
pub mod pathdb;
pub mod persistence;
pub mod records;
pub mod sim;
pub mod situation;

pub use config::PathDbConfig;
pub use pathdb::{PathDatabase, ShotClass};
pub use sim::{BallState, PhysicsParameters, SimulatedPath};

use glam::{Vec2, Vec3};

/// Court and simulation constants
pub mod consts {
    /// Fixed sampling period of simulated paths (seconds)
    pub const SAMPLING_PERIOD: f32 = 0.01;
    /// Contacts allowed before the simulator stops looking for a rally point
    pub const MAX_BOUNCES: u32 = 4;
    /// Below this height the ball has left the court
    pub const ESCAPE_HEIGHT: f32 = -1.0;

    /// Court half-extents (10m x 20m court centred on the net)
    pub const COURT_HALF_WIDTH: f32 = 5.0;
    pub const COURT_HALF_LENGTH: f32 = 10.0;

    /// Net height at the centre of the court
    pub const NET_HEIGHT: f32 = 0.88;
    /// Glass panels height; the metal grid continues above it
    pub const GLASS_HEIGHT: f32 = 3.0;
    pub const BACK_GRID_TOP: f32 = 4.0;
    /// Side glass panels run this far from each back wall
    pub const SIDE_GLASS_LENGTH: f32 = 4.0;

    /// Contacts beyond this depth count as back-wall bounces
    pub const BACK_BOUNCE_DEPTH: f32 = 9.9;

    /// Height band a player can reach with the racket
    pub const REACHABLE_MIN_HEIGHT: f32 = 0.2;
    pub const REACHABLE_MAX_HEIGHT: f32 = 2.2;

    /// Default number of precomputed paths
    pub const CORPUS_SIZE: usize = 10_000;
}

/// Project a 3D court position onto the floor plane (x, z)
#[inline]
pub fn floor_point(p: Vec3) -> Vec2 {
    Vec2::new(p.x, p.z)
}

/// Which of the court axes a mirrored copy is reflected across
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mirror {
    pub x: bool,
    pub z: bool,
}

impl Mirror {
    pub const NONE: Self = Self { x: false, z: false };
    pub const X: Self = Self { x: true, z: false };
    pub const Z: Self = Self { x: false, z: true };
    pub const XZ: Self = Self { x: true, z: true };

    /// All four symmetries, identity first
    pub const ALL: [Self; 4] = [Self::NONE, Self::X, Self::Z, Self::XZ];

    fn signs(self) -> (f32, f32) {
        (
            if self.x { -1.0 } else { 1.0 },
            if self.z { -1.0 } else { 1.0 },
        )
    }

    /// Mirror a position or velocity
    #[inline]
    pub fn point(self, p: Vec3) -> Vec3 {
        let (sx, sz) = self.signs();
        Vec3::new(p.x * sx, p.y, p.z * sz)
    }

    /// Mirror a floor-plane point
    #[inline]
    pub fn planar(self, p: Vec2) -> Vec2 {
        let (sx, sz) = self.signs();
        Vec2::new(p.x * sx, p.y * sz)
    }

    /// Mirror an angular velocity (axial vector: the components parallel to
    /// the mirror plane flip, the normal one is kept)
    #[inline]
    pub fn axial(self, w: Vec3) -> Vec3 {
        let (sx, sz) = self.signs();
        let det = sx * sz;
        Vec3::new(w.x * sx, w.y, w.z * sz) * det
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_is_an_involution() {
        let p = Vec3::new(1.5, 0.7, -3.0);
        for m in Mirror::ALL {
            assert_eq!(m.point(m.point(p)), p);
            assert_eq!(m.axial(m.axial(p)), p);
        }
    }

    #[test]
    fn mirror_x_flips_only_x() {
        assert_eq!(
            Mirror::X.point(Vec3::new(1.0, 2.0, 3.0)),
            Vec3::new(-1.0, 2.0, 3.0)
        );
        assert_eq!(Mirror::XZ.planar(Vec2::new(1.0, 2.0)), Vec2::new(-1.0, -2.0));
    }

    #[test]
    fn mirror_axial_keeps_normal_component() {
        // Reflection across the x = 0 plane: w_x is kept, w_y and w_z flip
        assert_eq!(
            Mirror::X.axial(Vec3::new(1.0, 2.0, 3.0)),
            Vec3::new(1.0, -2.0, -3.0)
        );
        // Two reflections compose to a rotation about y
        assert_eq!(
            Mirror::XZ.axial(Vec3::new(1.0, 2.0, 3.0)),
            Vec3::new(-1.0, 2.0, -3.0)
        );
    }
}
