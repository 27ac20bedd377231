//! Game situations replayed from historical rallies
//!
//! A situation is two consecutive shots of a real rally. Each shot is matched
//! to the most similar stored path, re-simulated on the live table to make
//! sure it is still legal there, and paired with where the other players
//! stood when it was played.

use glam::{Vec2, Vec3};
use log::{debug, info};
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::pathdb::{PathDatabase, RetrievalError};
use crate::records::{HistoricalShotRecord, RecordError, Role};
use crate::sim::{LegalityViolation, Table};

/// Record pairs tried before giving up
pub const MAX_SITUATION_ATTEMPTS: usize = 1000;

#[derive(Debug, Error)]
pub enum SituationError {
    #[error("No pair of consecutive records can be replayed")]
    NoSuitablePair,

    #[error("Every attempt was rejected ({attempts} attempts)")]
    Exhausted { attempts: usize },
}

/// Why one record pair could not be turned into a situation
#[derive(Debug, Error)]
enum Rejection {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    #[error(transparent)]
    Legality(#[from] LegalityViolation),
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Where everybody stands, from the point of view of the trained player
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CourtPositions {
    pub self_position: Vec2,
    pub ally: Vec2,
    pub adversary1: Vec2,
    pub adversary2: Vec2,
}

/// One validated shot and the players around it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SituationShot {
    pub starting_position: Vec3,
    pub starting_velocity: Vec3,
    pub starting_spin: Vec3,
    pub positions: CourtPositions,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GameSituation {
    pub shots: [SituationShot; 2],
}

/// Place every player of a record by role. Opponents in the first and third
/// columns become adversary 1, the others adversary 2.
pub fn assign_positions(record: &HistoricalShotRecord) -> Result<CourtPositions, RecordError> {
    let mut positions = CourtPositions::default();
    for (slot, player) in record.players.iter().enumerate() {
        match player.role()? {
            Role::Receiver => positions.self_position = player.position,
            Role::Teammate => positions.ally = player.position,
            Role::Opponent if slot % 2 == 0 => positions.adversary1 = player.position,
            Role::Opponent => positions.adversary2 = player.position,
        }
    }
    Ok(positions)
}

/// Indices `i` such that records `i` and `i + 1` are both suitable
pub fn suitable_pairs(records: &[HistoricalShotRecord]) -> Vec<usize> {
    records
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0].is_suitable() && pair[1].is_suitable())
        .map(|(i, _)| i)
        .collect()
}

fn replay_shot<R: Rng + ?Sized>(
    table: &mut Table,
    db: &PathDatabase,
    record: &HistoricalShotRecord,
    rng: &mut R,
) -> Result<SituationShot, Rejection> {
    let path = db.find_for_record(record)?;
    table.simulate_path(
        path.starting_position,
        path.starting_velocity,
        path.starting_spin,
        rng,
    )?;

    Ok(SituationShot {
        starting_position: path.starting_position,
        starting_velocity: path.starting_velocity,
        starting_spin: path.starting_spin,
        positions: assign_positions(record)?,
    })
}

/// Build a situation from a random pair of consecutive suitable records
pub fn random_situation<R: Rng + ?Sized>(
    table: &mut Table,
    db: &PathDatabase,
    records: &[HistoricalShotRecord],
    rng: &mut R,
) -> Result<GameSituation, SituationError> {
    let pairs = suitable_pairs(records);
    if pairs.is_empty() {
        return Err(SituationError::NoSuitablePair);
    }

    for attempt in 1..=MAX_SITUATION_ATTEMPTS {
        let i = pairs[rng.random_range(0..pairs.len())];

        let shots = replay_shot(table, db, &records[i], rng)
            .and_then(|first| Ok([first, replay_shot(table, db, &records[i + 1], rng)?]));

        match shots {
            Ok(shots) => {
                info!(
                    "Situation from records {} and {} (attempt {attempt})",
                    records[i].id,
                    records[i + 1].id
                );
                return Ok(GameSituation { shots });
            }
            Err(e) => debug!("Rejected records at {i}: {e}"),
        }
    }

    Err(SituationError::Exhausted {
        attempts: MAX_SITUATION_ATTEMPTS,
    })
}
