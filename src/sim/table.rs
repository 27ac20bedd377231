//! Live table: the ball in play, the other participants and the racket
//!
//! Path simulation borrows the live ball as scratch space. While a sandboxed
//! simulation runs the other participants and the racket are switched off,
//! and everything it touched is put back when the sandbox is dropped, on the
//! error path as well.

use std::ops::{Deref, DerefMut};

use glam::{Vec2, Vec3};
use log::debug;
use rand::Rng;

use super::collision::{RacketSample, StrikingImplement, detect_collision, resolve_collision};
use super::path::{LegalityViolation, SimulatedPath, run_simulation};
use super::physics::integrate_step;
use super::state::{BallState, PhysicsParameters};
use super::surface::{Court, SurfaceTag};

/// What the table is currently doing with the ball
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    /// Waiting for the user; the ball is frozen
    Idle,
    /// A sandboxed path simulation owns the ball
    PathSimulation,
    /// The ball is stepped every frame
    LiveGameplay,
}

/// Another player on court (ally or adversary)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Participant {
    pub position: Vec2,
    pub active: bool,
}

impl Participant {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            active: true,
        }
    }
}

/// The tracked racket and whether it currently takes part in collisions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Racket {
    pub sample: RacketSample,
    pub active: bool,
}

/// Live court session
#[derive(Debug, Clone)]
pub struct Table {
    pub court: Court,
    pub params: PhysicsParameters,
    pub ball: BallState,
    pub mode: TableMode,
    /// Ally, adversary 1, adversary 2
    pub participants: [Participant; 3],
    pub racket: Option<Racket>,
}

impl Table {
    pub fn new(court: Court, params: PhysicsParameters) -> Self {
        Self {
            court,
            params,
            ball: BallState::default(),
            mode: TableMode::Idle,
            participants: [Participant::at(Vec2::ZERO); 3],
            racket: None,
        }
    }

    /// Attach or update the racket sample from the tracking collaborator
    pub fn set_racket(&mut self, sample: RacketSample) {
        let active = self.racket.map(|r| r.active).unwrap_or(true);
        self.racket = Some(Racket { sample, active });
    }

    /// Launch a shot in live play
    pub fn serve(&mut self, position: Vec3, velocity: Vec3, spin: Vec3) {
        self.ball = BallState::new(position, velocity, spin);
        self.mode = TableMode::LiveGameplay;
    }

    /// Advance the live ball by `dt`. Returns the tag of any surface hit.
    ///
    /// Does nothing unless the table is in live gameplay.
    pub fn step<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) -> Option<SurfaceTag> {
        if self.mode != TableMode::LiveGameplay {
            return None;
        }

        let previous = self.ball.position;
        integrate_step(&mut self.ball, &self.params, dt);

        let hit = detect_collision(&self.court, previous, self.ball.position, self.params.radius)?;
        let implement = self
            .racket
            .as_ref()
            .filter(|r| r.active)
            .map(|r| &r.sample as &dyn StrikingImplement);
        Some(resolve_collision(
            &mut self.ball,
            &hit,
            &self.params,
            implement,
            rng,
        ))
    }

    /// Simulate a proposed shot using the table's ball, then restore the
    /// table exactly as it was
    pub fn simulate_path<R: Rng + ?Sized>(
        &mut self,
        origin: Vec3,
        velocity: Vec3,
        spin: Vec3,
        rng: &mut R,
    ) -> Result<SimulatedPath, LegalityViolation> {
        let mut sandbox = Sandbox::enter(self);
        sandbox.ball = BallState::new(origin, velocity, spin);

        let Table {
            court, params, ball, ..
        } = &mut *sandbox;
        run_simulation(ball, &*court, &*params, rng)
    }
}

/// Snapshot of everything a sandboxed simulation mutates
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    mode: TableMode,
    ball: BallState,
    participants_active: [bool; 3],
    racket_active: Option<bool>,
}

/// Exclusive access to a table in simulation mode; restores on drop
struct Sandbox<'a> {
    table: &'a mut Table,
    saved: Snapshot,
}

impl<'a> Sandbox<'a> {
    fn enter(table: &'a mut Table) -> Self {
        let saved = Snapshot {
            mode: table.mode,
            ball: table.ball,
            participants_active: table.participants.map(|p| p.active),
            racket_active: table.racket.map(|r| r.active),
        };

        table.mode = TableMode::PathSimulation;
        for p in &mut table.participants {
            p.active = false;
        }
        if let Some(racket) = &mut table.racket {
            racket.active = false;
        }

        Self { table, saved }
    }
}

impl Deref for Sandbox<'_> {
    type Target = Table;

    fn deref(&self) -> &Table {
        self.table
    }
}

impl DerefMut for Sandbox<'_> {
    fn deref_mut(&mut self) -> &mut Table {
        self.table
    }
}

impl Drop for Sandbox<'_> {
    fn drop(&mut self) {
        let saved = self.saved;
        self.table.mode = saved.mode;
        self.table.ball = saved.ball;
        for (p, active) in self.table.participants.iter_mut().zip(saved.participants_active) {
            p.active = active;
        }
        if let (Some(racket), Some(active)) = (&mut self.table.racket, saved.racket_active) {
            racket.active = active;
        }
        debug!("Sandbox closed, table restored to {:?}", saved.mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::Aabb;
    use crate::sim::state::seeded_rng;

    fn live_table() -> Table {
        let mut table = Table::new(Court::standard(), PhysicsParameters::default());
        table.participants[1].active = false;
        table.set_racket(RacketSample {
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            pivot: Vec3::ZERO,
            bounds: Aabb::new(Vec3::splat(-0.1), Vec3::splat(0.1)),
        });
        table.serve(Vec3::new(1.0, 2.0, -3.0), Vec3::new(0.0, 1.0, 4.0), Vec3::X);
        table
    }

    fn assert_restored(before: &Table, after: &Table) {
        assert_eq!(after.mode, before.mode);
        assert_eq!(after.ball, before.ball);
        assert_eq!(after.participants, before.participants);
        assert_eq!(after.racket, before.racket);
    }

    #[test]
    fn test_sandbox_restores_after_success() {
        let mut table = live_table();
        let before = table.clone();
        let path = table
            .simulate_path(
                Vec3::new(0.0, 1.0, 5.0),
                Vec3::new(0.0, 4.0, -8.0),
                Vec3::ZERO,
                &mut seeded_rng(0),
            )
            .expect("legal shot");
        assert!(!path.contacts.is_empty());
        assert_restored(&before, &table);
    }

    #[test]
    fn test_sandbox_restores_after_failure() {
        let mut table = live_table();
        let before = table.clone();
        let result = table.simulate_path(
            Vec3::new(0.0, 1.0, -5.0),
            Vec3::new(0.0, 0.0, -8.0),
            Vec3::ZERO,
            &mut seeded_rng(0),
        );
        assert_eq!(result, Err(LegalityViolation::BouncedOnServingSide));
        assert_restored(&before, &table);
    }

    #[test]
    fn test_sandbox_matches_free_simulation() {
        let mut table = live_table();
        let origin = Vec3::new(1.0, 1.0, 6.0);
        let velocity = Vec3::new(-1.0, 4.0, -10.0);
        let sandboxed = table.simulate_path(origin, velocity, Vec3::ZERO, &mut seeded_rng(4));
        let free = crate::sim::simulate_path(
            &table.court,
            &table.params,
            &mut seeded_rng(4),
            origin,
            velocity,
            Vec3::ZERO,
        );
        assert_eq!(sandboxed, free);
    }

    #[test]
    fn test_sandbox_deactivates_participants_while_running() {
        let mut table = live_table();
        {
            let sandbox = Sandbox::enter(&mut table);
            assert_eq!(sandbox.mode, TableMode::PathSimulation);
            assert!(sandbox.participants.iter().all(|p| !p.active));
            assert_eq!(sandbox.racket.map(|r| r.active), Some(false));
        }
        assert_eq!(table.mode, TableMode::LiveGameplay);
        assert!(table.participants[0].active);
        assert!(!table.participants[1].active);
        assert_eq!(table.racket.map(|r| r.active), Some(true));
    }

    #[test]
    fn test_step_only_runs_in_live_gameplay() {
        let mut table = Table::new(Court::standard(), PhysicsParameters::default());
        table.ball = BallState::at_rest(Vec3::new(0.0, 1.0, 0.0));
        let mut rng = seeded_rng(0);
        assert_eq!(table.step(0.01, &mut rng), None);
        assert_eq!(table.ball.position, Vec3::new(0.0, 1.0, 0.0));

        table.serve(Vec3::new(0.0, 1.0, 3.0), Vec3::ZERO, Vec3::ZERO);
        let mut floor_hits = 0;
        for _ in 0..200 {
            if table.step(0.01, &mut rng) == Some(SurfaceTag::Floor) {
                floor_hits += 1;
            }
        }
        assert!(floor_hits >= 1);
        assert!(table.ball.position.y >= 0.0);
    }
}
