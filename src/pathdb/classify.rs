//! Shot classes and the bounce-sequence classifier

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::BACK_BOUNCE_DEPTH;

/// Shot class by the sequence of contacts since the shot left the racket
///
/// Variants are declared in stage order; the classifier only ever moves a
/// shot to a later stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotClass {
    NoBounce,
    SingleBounce,
    SideBounce,
    BackBounce,
    SideBackBounces,
    BackSideBounces,
}

impl ShotClass {
    pub const COUNT: usize = 6;

    pub const ALL: [Self; Self::COUNT] = [
        Self::NoBounce,
        Self::SingleBounce,
        Self::SideBounce,
        Self::BackBounce,
        Self::SideBackBounces,
        Self::BackSideBounces,
    ];

    /// Position in `ALL`, for array-indexed tables
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case name, used in file names and the CLI
    pub fn name(self) -> &'static str {
        match self {
            Self::NoBounce => "no_bounce",
            Self::SingleBounce => "single_bounce",
            Self::SideBounce => "side_bounce",
            Self::BackBounce => "back_bounce",
            Self::SideBackBounces => "side_back_bounces",
            Self::BackSideBounces => "back_side_bounces",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Map a historical shot tag to its class. `None` for unknown tags.
    pub fn from_shot_tag(tag: &str) -> Option<Self> {
        let class = match tag {
            "SPD" | "SPR" | "BPD" | "BPR" | "CD" | "CR" => Self::BackBounce,
            "DPA" | "DPAG" => Self::SideBackBounces,
            "DPC" | "DPCG" => Self::BackSideBounces,
            "D" | "R" | "R1" | "R2" => Self::SingleBounce,
            "AD" | "AR" | "PLD" | "PLR" => Self::SideBounce,
            "VD" | "VR" | "B" | "DJD" => Self::NoBounce,
            _ => return None,
        };
        Some(class)
    }

    /// No further contact changes the class
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::SideBackBounces | Self::BackSideBounces)
    }

    /// Class after one more contact at `contact`
    pub fn next_stage(self, contact: Vec3) -> Self {
        match self {
            Self::NoBounce => Self::SingleBounce,
            Self::SingleBounce => {
                if contact.z.abs() <= BACK_BOUNCE_DEPTH {
                    Self::SideBounce
                } else {
                    Self::BackBounce
                }
            }
            Self::SideBounce => Self::SideBackBounces,
            Self::BackBounce => Self::BackSideBounces,
            terminal => terminal,
        }
    }
}

impl fmt::Display for ShotClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Advance `class` by one contact at `contact`
#[inline]
pub fn classify_next_stage(class: ShotClass, contact: Vec3) -> ShotClass {
    class.next_stage(contact)
}
