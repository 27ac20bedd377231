//! Deterministic simulation module
//!
//! All ball physics lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (passed in by the caller)
//! - No I/O

pub mod collision;
pub mod path;
pub mod physics;
pub mod state;
pub mod surface;
pub mod table;

pub use collision::{
    Aabb, GRID_NOISE, NET_DAMPING, RacketSample, StrikingImplement, detect_collision, reflect,
    resolve_collision,
};
pub use path::{
    LegalityViolation, SimulatedPath, is_on_opponent_side, run_simulation, simulate_path,
};
pub use physics::{integrate_step, total_force};
pub use state::{BallState, PhysicsParameters, SimRng, seeded_rng};
pub use surface::{Axis, Court, RayHit, Rect, SurfaceProvider, SurfaceTag};
pub use table::{Participant, Racket, Table, TableMode};
