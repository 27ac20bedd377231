//! Path simulation with rally legality checks
//!
//! A proposed shot is integrated at a fixed sampling period until it reaches
//! a rally point (a second floor contact after landing on the opponent's
//! side), exhausts its bounce budget, or breaks a rule.

use std::collections::BTreeMap;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collision::{detect_collision, resolve_collision};
use super::physics::integrate_step;
use super::state::{BallState, PhysicsParameters};
use super::surface::{SurfaceProvider, SurfaceTag};
use crate::Mirror;
use crate::consts::*;

/// Why a proposed shot is not a valid rally shot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LegalityViolation {
    #[error("Invalid shot: ball has escaped the court")]
    EscapedCourt,
    #[error("Invalid shot: ball bounced on the same side as the serve")]
    BouncedOnServingSide,
    #[error("Invalid shot: ball hit the wall or grid before bouncing on the opponent's side")]
    HitWallBeforeLanding,
    #[error("Invalid shot: ball hit the net")]
    HitNet,
    #[error("Invalid shot: ball collided with an invalid object '{tag}'")]
    InvalidCollisionObject { tag: SurfaceTag },
}

/// A legality-checked trajectory sampled at `SAMPLING_PERIOD`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedPath {
    /// Ball centre at every sample, starting with the origin
    pub coordinates: Vec<Vec3>,
    /// Sample index -> contact point, for every recorded bounce
    pub contacts: BTreeMap<usize, Vec3>,
    pub starting_position: Vec3,
    pub starting_velocity: Vec3,
    pub starting_spin: Vec3,
}

impl SimulatedPath {
    fn start(position: Vec3, velocity: Vec3, spin: Vec3) -> Self {
        Self {
            coordinates: vec![position],
            contacts: BTreeMap::new(),
            starting_position: position,
            starting_velocity: velocity,
            starting_spin: spin,
        }
    }

    /// First sample (the origin)
    pub fn first(&self) -> Vec3 {
        self.coordinates.first().copied().unwrap_or(self.starting_position)
    }

    /// Last sample
    pub fn last(&self) -> Vec3 {
        self.coordinates.last().copied().unwrap_or(self.starting_position)
    }

    /// Flight time covered by the samples (seconds)
    pub fn duration(&self) -> f32 {
        self.coordinates.len().saturating_sub(1) as f32 * SAMPLING_PERIOD
    }

    /// Copy of this path reflected across the given court axes
    pub fn mirrored(&self, mirror: Mirror) -> Self {
        if mirror == Mirror::NONE {
            return self.clone();
        }
        Self {
            coordinates: self.coordinates.iter().map(|&p| mirror.point(p)).collect(),
            contacts: self
                .contacts
                .iter()
                .map(|(&i, &p)| (i, mirror.point(p)))
                .collect(),
            starting_position: mirror.point(self.starting_position),
            starting_velocity: mirror.point(self.starting_velocity),
            starting_spin: mirror.axial(self.starting_spin),
        }
    }
}

/// Whether a floor contact at `position` is on the receiving side
#[inline]
pub fn is_on_opponent_side(position: Vec3, serving_from_positive_side: bool) -> bool {
    if serving_from_positive_side {
        position.z < 0.0
    } else {
        position.z > 0.0
    }
}

/// Simulate a proposed shot on a fresh ball
pub fn simulate_path<S, R>(
    surfaces: &S,
    params: &PhysicsParameters,
    rng: &mut R,
    origin: Vec3,
    velocity: Vec3,
    spin: Vec3,
) -> Result<SimulatedPath, LegalityViolation>
where
    S: SurfaceProvider + ?Sized,
    R: Rng + ?Sized,
{
    let mut ball = BallState::new(origin, velocity, spin);
    run_simulation(&mut ball, surfaces, params, rng)
}

/// Drive `ball` from its current state until the shot resolves.
///
/// `ball` is scratch space: it is left wherever the simulation stopped.
pub fn run_simulation<S, R>(
    ball: &mut BallState,
    surfaces: &S,
    params: &PhysicsParameters,
    rng: &mut R,
) -> Result<SimulatedPath, LegalityViolation>
where
    S: SurfaceProvider + ?Sized,
    R: Rng + ?Sized,
{
    let mut path = SimulatedPath::start(ball.position, ball.velocity, ball.spin);

    let serving_from_positive_side = ball.position.z > 0.0;
    let mut bounces = 0u32;
    let mut has_hit_opponent_side = false;

    while bounces < MAX_BOUNCES {
        integrate_step(ball, params, SAMPLING_PERIOD);

        if ball.position.y < ESCAPE_HEIGHT {
            return Err(LegalityViolation::EscapedCourt);
        }

        let previous = path.last();
        if let Some(hit) = detect_collision(surfaces, previous, ball.position, params.radius) {
            let tag = resolve_collision(ball, &hit, params, None, rng);
            bounces += 1;
            let sample_index = path.coordinates.len();

            match tag {
                SurfaceTag::Floor => {
                    if !has_hit_opponent_side {
                        if !is_on_opponent_side(ball.position, serving_from_positive_side) {
                            return Err(LegalityViolation::BouncedOnServingSide);
                        }
                        path.contacts.insert(sample_index, hit.point);
                        has_hit_opponent_side = true;
                    } else if bounces > 1 {
                        // Second floor contact: the rally point is reached
                        break;
                    }
                }
                SurfaceTag::Wall | SurfaceTag::Grid => {
                    if !has_hit_opponent_side {
                        return Err(LegalityViolation::HitWallBeforeLanding);
                    }
                    path.contacts.insert(sample_index, hit.point);
                }
                SurfaceTag::Net => return Err(LegalityViolation::HitNet),
                tag @ (SurfaceTag::Racket | SurfaceTag::Other) => {
                    return Err(LegalityViolation::InvalidCollisionObject { tag });
                }
            }
        }

        path.coordinates.push(ball.position);
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::seeded_rng;
    use crate::sim::surface::{Axis, Court, Rect};

    fn simulate(origin: Vec3, velocity: Vec3) -> Result<SimulatedPath, LegalityViolation> {
        simulate_path(
            &Court::standard(),
            &PhysicsParameters::default(),
            &mut seeded_rng(0),
            origin,
            velocity,
            Vec3::ZERO,
        )
    }

    #[test]
    fn test_arcing_shot_lands_on_opponent_side() {
        let path = simulate(Vec3::new(0.0, 1.0, 5.0), Vec3::new(0.0, 4.0, -8.0))
            .expect("legal shot");

        let (_, first_contact) = path.contacts.iter().next().expect("recorded contact");
        assert!(first_contact.z < 0.0);
        assert!(first_contact.y.abs() < 1e-6, "first contact is a floor bounce");
        assert_eq!(path.first(), Vec3::new(0.0, 1.0, 5.0));
        assert_eq!(path.starting_velocity, Vec3::new(0.0, 4.0, -8.0));
        assert!(path.coordinates.iter().all(|p| p.y > ESCAPE_HEIGHT));
    }

    #[test]
    fn test_flat_shot_falls_short_on_own_side() {
        // Falls 1m in ~0.45s and only covers ~3.5m: lands before the net
        assert_eq!(
            simulate(Vec3::new(0.0, 1.0, 5.0), Vec3::new(0.0, 0.0, -8.0)),
            Err(LegalityViolation::BouncedOnServingSide)
        );
    }

    #[test]
    fn test_flipped_origin_bounces_on_serving_side() {
        assert_eq!(
            simulate(Vec3::new(0.0, 1.0, -5.0), Vec3::new(0.0, 0.0, -8.0)),
            Err(LegalityViolation::BouncedOnServingSide)
        );
    }

    #[test]
    fn test_low_shot_hits_net() {
        assert_eq!(
            simulate(Vec3::new(0.0, 0.5, 2.0), Vec3::new(0.0, 0.5, -15.0)),
            Err(LegalityViolation::HitNet)
        );
    }

    #[test]
    fn test_shot_into_own_back_wall_is_illegal() {
        assert_eq!(
            simulate(Vec3::new(0.0, 1.5, 8.0), Vec3::new(0.0, 1.0, 12.0)),
            Err(LegalityViolation::HitWallBeforeLanding)
        );
    }

    #[test]
    fn test_lob_over_the_walls_escapes() {
        assert_eq!(
            simulate(Vec3::new(0.0, 1.0, 5.0), Vec3::new(0.0, 9.0, -16.0)),
            Err(LegalityViolation::EscapedCourt)
        );
    }

    #[test]
    fn test_unknown_object_is_rejected() {
        let court = Court::standard().with(Rect::new(
            SurfaceTag::Other,
            Axis::Z,
            3.0,
            Vec3::new(-5.0, 0.0, 3.0),
            Vec3::new(5.0, 5.0, 3.0),
        ));
        let result = simulate_path(
            &court,
            &PhysicsParameters::default(),
            &mut seeded_rng(0),
            Vec3::new(0.0, 1.0, 5.0),
            Vec3::new(0.0, 4.0, -8.0),
            Vec3::ZERO,
        );
        assert_eq!(
            result,
            Err(LegalityViolation::InvalidCollisionObject {
                tag: SurfaceTag::Other
            })
        );
        let message = result.unwrap_err().to_string();
        assert!(message.contains("'Other'"));
    }

    #[test]
    fn test_net_after_landing_is_still_illegal() {
        // Lands near z = -3.1, then rebounds about 0.4m high over z = -3.6
        let hurdle = Rect::new(
            SurfaceTag::Net,
            Axis::Z,
            -3.6,
            Vec3::new(-5.0, 0.0, -3.6),
            Vec3::new(5.0, 0.6, -3.6),
        );
        let params = PhysicsParameters::vacuum();
        let shot = |court: &Court| {
            simulate_path(
                court,
                &params,
                &mut seeded_rng(0),
                Vec3::new(0.0, 1.0, 5.0),
                Vec3::new(0.0, 4.0, -8.0),
                Vec3::ZERO,
            )
        };

        let clear = shot(&Court::standard()).expect("legal without the extra net");
        assert_eq!(clear.contacts.len(), 1);
        assert_eq!(
            shot(&Court::standard().with(hurdle)),
            Err(LegalityViolation::HitNet)
        );
    }

    #[test]
    fn test_back_wall_after_landing_is_recorded() {
        // Lands near z = -7.1 and reaches the back glass about 1m up
        let path = simulate_path(
            &Court::standard(),
            &PhysicsParameters::vacuum(),
            &mut seeded_rng(0),
            Vec3::new(0.0, 1.0, 5.0),
            Vec3::new(0.0, 4.0, -12.0),
            Vec3::ZERO,
        )
        .expect("legal shot");

        let contacts: Vec<_> = path.contacts.iter().collect();
        assert_eq!(contacts.len(), 2, "floor then back wall");
        let (&floor_index, floor) = contacts[0];
        let (&wall_index, wall) = contacts[1];
        assert!(floor.y.abs() < 1e-6);
        assert!(floor.z < -6.0);
        assert!((wall.z + COURT_HALF_LENGTH).abs() < 1e-6);
        assert!(wall.y > 0.5 && wall.y < GLASS_HEIGHT);
        assert!(floor_index < wall_index && wall_index < path.coordinates.len());
    }

    #[test]
    fn test_bounce_budget_ends_the_shot() {
        // Low gravity and lossless contacts: after landing the ball hits the
        // right glass, the back glass and the left grid before falling again
        let params = PhysicsParameters {
            gravity: 0.5,
            restitution: 1.0,
            ..PhysicsParameters::vacuum()
        };
        let path = simulate_path(
            &Court::standard(),
            &params,
            &mut seeded_rng(0),
            Vec3::new(-4.5, 2.0, 1.0),
            Vec3::new(3.0, 0.0, -3.0),
            Vec3::ZERO,
        )
        .expect("legal shot");

        assert_eq!(path.contacts.len(), MAX_BOUNCES as usize);
        let first = path.contacts.values().next().expect("landing");
        assert!(first.y.abs() < 1e-6);
        assert!(path.contacts.values().skip(1).all(|c| c.y > 0.2));
        // Still in the air when the budget runs out
        assert!(path.last().y > 0.5);
    }

    #[test]
    fn test_contacts_index_existing_samples() {
        let path = simulate(Vec3::new(-1.0, 1.2, 6.0), Vec3::new(1.0, 4.5, -11.0))
            .expect("legal shot");
        for &index in path.contacts.keys() {
            assert!(index < path.coordinates.len());
        }
        assert!(path.duration() > 0.5);
    }

    #[test]
    fn test_simulation_is_deterministic() {
        let a = simulate(Vec3::new(1.0, 1.0, 6.0), Vec3::new(-1.0, 4.0, -10.0));
        let b = simulate(Vec3::new(1.0, 1.0, 6.0), Vec3::new(-1.0, 4.0, -10.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_mirrored_path_reflects_every_sample() {
        let path = simulate(Vec3::new(1.0, 1.0, 6.0), Vec3::new(-1.0, 4.0, -10.0)).unwrap();
        let mirrored = path.mirrored(Mirror::X);
        assert_eq!(mirrored.coordinates.len(), path.coordinates.len());
        for (a, b) in path.coordinates.iter().zip(&mirrored.coordinates) {
            assert_eq!(b.x, -a.x);
            assert_eq!(b.y, a.y);
            assert_eq!(b.z, a.z);
        }
        assert_eq!(mirrored.starting_velocity.x, 1.0);
        assert_eq!(
            mirrored.contacts.keys().collect::<Vec<_>>(),
            path.contacts.keys().collect::<Vec<_>>()
        );
        assert_eq!(mirrored.mirrored(Mirror::X), path);
    }
}
