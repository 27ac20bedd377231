//! Historical match records
//!
//! Amateur match data tracked in 2D: one row per shot with the four players,
//! the ball, where the shot was hit from and where it was aimed. Raw
//! coordinates have their origin in a court corner; records are re-centred on
//! the net so they share the court frame of the simulator.

use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;

use glam::Vec2;
use log::info;
use serde::Deserialize;
use thiserror::Error;

use crate::consts::{COURT_HALF_LENGTH, COURT_HALF_WIDTH};
use crate::pathdb::ShotClass;

/// Players must stand inside this half-width to be replayed
pub const PLAYABLE_HALF_WIDTH: f32 = 4.5;
/// Players must stand inside this half-length to be replayed
pub const PLAYABLE_HALF_LENGTH: f32 = 9.5;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown role: {role}")]
    UnknownRole { role: String },
}

/// Role of a tracked player relative to the player being trained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Receiver,
    Teammate,
    Opponent,
}

impl FromStr for Role {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "receiver" => Ok(Self::Receiver),
            "teammate" => Ok(Self::Teammate),
            "opponent" => Ok(Self::Opponent),
            other => Err(RecordError::UnknownRole {
                role: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Receiver => "receiver",
            Self::Teammate => "teammate",
            Self::Opponent => "opponent",
        };
        f.write_str(s)
    }
}

/// One tracked player in a record
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSample {
    /// Raw role label, parsed on demand with [`PlayerSample::role`]
    pub role: String,
    pub position: Vec2,
    pub velocity: Vec2,
}

impl PlayerSample {
    pub fn role(&self) -> Result<Role, RecordError> {
        self.role.parse()
    }
}

/// A historical shot, in the court frame (x across, second axis along z)
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalShotRecord {
    pub id: u32,
    pub frame: u32,
    pub time: f32,
    pub players: [PlayerSample; 4],
    pub ball: Vec2,
    pub shot: String,
    pub target: Vec2,
    pub from: Vec2,
    pub duration: f32,
    pub shot_full: String,
    pub last_hit: char,
    pub rally: u32,
}

impl HistoricalShotRecord {
    /// Shot class of the full shot tag, if the tag is known
    pub fn shot_class(&self) -> Option<ShotClass> {
        ShotClass::from_shot_tag(&self.shot_full)
    }

    /// Whether this record can be replayed on the simulated court: a known
    /// shot tag and every player within the playable area
    pub fn is_suitable(&self) -> bool {
        self.shot_class().is_some() && self.players.iter().all(|p| is_playable(p.position))
    }
}

/// Inside the playable rectangle (bounds inclusive)
pub fn is_playable(p: Vec2) -> bool {
    p.x.abs() <= PLAYABLE_HALF_WIDTH && p.y.abs() <= PLAYABLE_HALF_LENGTH
}

/// Row layout of the match data file
#[derive(Debug, Deserialize)]
struct RawRecord {
    id: u32,
    frame: u32,
    time: f32,
    role1: String,
    x1: f32,
    y1: f32,
    role2: String,
    x2: f32,
    y2: f32,
    role3: String,
    x3: f32,
    y3: f32,
    role4: String,
    x4: f32,
    y4: f32,
    ballx: f32,
    bally: f32,
    speed1x: f32,
    speed1y: f32,
    speed2x: f32,
    speed2y: f32,
    speed3x: f32,
    speed3y: f32,
    speed4x: f32,
    speed4y: f32,
    shot: String,
    targetx: f32,
    targety: f32,
    fromx: f32,
    fromy: f32,
    duration: f32,
    shot_full: String,
    #[serde(rename = "lastHit")]
    last_hit: char,
    rally: u32,
}

/// Shift corner-origin coordinates to the centre of the court
#[inline]
fn centred(x: f32, y: f32) -> Vec2 {
    Vec2::new(x - COURT_HALF_WIDTH, y - COURT_HALF_LENGTH)
}

impl From<RawRecord> for HistoricalShotRecord {
    fn from(raw: RawRecord) -> Self {
        let player = |role: String, x, y, vx, vy| PlayerSample {
            role,
            position: centred(x, y),
            velocity: Vec2::new(vx, vy),
        };

        Self {
            id: raw.id,
            frame: raw.frame,
            time: raw.time,
            players: [
                player(raw.role1, raw.x1, raw.y1, raw.speed1x, raw.speed1y),
                player(raw.role2, raw.x2, raw.y2, raw.speed2x, raw.speed2y),
                player(raw.role3, raw.x3, raw.y3, raw.speed3x, raw.speed3y),
                player(raw.role4, raw.x4, raw.y4, raw.speed4x, raw.speed4y),
            ],
            ball: centred(raw.ballx, raw.bally),
            shot: raw.shot,
            target: centred(raw.targetx, raw.targety),
            from: centred(raw.fromx, raw.fromy),
            duration: raw.duration,
            shot_full: raw.shot_full,
            last_hit: raw.last_hit,
            rally: raw.rally,
        }
    }
}

/// Parse records from CSV text with a header row. Rows with a non-positive
/// duration are dropped.
pub fn parse_records<R: io::Read>(reader: R) -> Result<Vec<HistoricalShotRecord>, RecordError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in reader.deserialize::<RawRecord>() {
        let row = row?;
        if row.duration > 0.0 {
            records.push(HistoricalShotRecord::from(row));
        }
    }
    Ok(records)
}

/// Read records from a CSV file
pub fn read_records(path: &Path) -> Result<Vec<HistoricalShotRecord>, RecordError> {
    let file = std::fs::File::open(path)?;
    let records = parse_records(io::BufReader::new(file))?;
    info!("Loaded {} match records from {}", records.len(), path.display());
    Ok(records)
}
