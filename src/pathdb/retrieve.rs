//! Trajectory retrieval
//!
//! A query (origin, destination, class) is matched against the class index
//! directly and through the three court symmetries. Each candidate is mirrored
//! back into the caller's frame and the one whose endpoints lie closest to
//! the requested ones wins.

use glam::Vec2;
use log::info;
use thiserror::Error;

use super::classify::ShotClass;
use super::corpus::{ShotIndices, build_indices, generate_corpus, index_key};
use crate::records::HistoricalShotRecord;
use crate::sim::{PhysicsParameters, SimulatedPath, SurfaceProvider};
use crate::{Mirror, floor_point};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    #[error("No stored paths for shot class '{class}'")]
    IndexEmpty { class: ShotClass },

    #[error("Unknown shot tag '{tag}'")]
    UnknownShotTag { tag: String },
}

/// Precomputed trajectories plus one nearest-neighbour index per shot class
#[derive(Debug, Clone, Default)]
pub struct PathDatabase {
    paths: Vec<SimulatedPath>,
    indices: ShotIndices,
}

impl PathDatabase {
    pub fn new(paths: Vec<SimulatedPath>, indices: ShotIndices) -> Self {
        Self { paths, indices }
    }

    /// Generate a corpus on `surfaces` and index it
    pub fn generate<S>(surfaces: &S, params: &PhysicsParameters, size: usize, seed: u64) -> Self
    where
        S: SurfaceProvider + Sync + ?Sized,
    {
        let paths = generate_corpus(surfaces, params, size, seed);
        let indices = build_indices(&paths);
        info!(
            "Path database ready: {} paths, {} indexed samples",
            paths.len(),
            indices.total_len()
        );
        Self { paths, indices }
    }

    pub fn paths(&self) -> &[SimulatedPath] {
        &self.paths
    }

    pub fn indices(&self) -> &ShotIndices {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Stored path whose endpoints best match (from, target) for `class`,
    /// expressed in the caller's frame
    pub fn find_most_similar(
        &self,
        from_x: f32,
        from_z: f32,
        target_x: f32,
        target_z: f32,
        class: ShotClass,
    ) -> Result<SimulatedPath, RetrievalError> {
        let tree = self.indices.get(class);
        let from = Vec2::new(from_x, from_z);
        let target = Vec2::new(target_x, target_z);

        // (score, corpus index, symmetry)
        let mut best: Option<(f32, usize, Mirror)> = None;

        for mirror in Mirror::ALL {
            let key = index_key(mirror.planar(from), mirror.planar(target));
            let Some((_, &index)) = tree.find_nearest(&key) else {
                return Err(RetrievalError::IndexEmpty { class });
            };
            let Some(path) = self.paths.get(index) else {
                continue;
            };

            let start = mirror.planar(floor_point(path.first()));
            let end = mirror.planar(floor_point(path.last()));
            let score = start.distance(from) + end.distance(target);

            if best.is_none_or(|(best_score, ..)| score < best_score) {
                best = Some((score, index, mirror));
            }
        }

        best.map(|(_, index, mirror)| self.paths[index].mirrored(mirror))
            .ok_or(RetrievalError::IndexEmpty { class })
    }

    /// Most similar stored path for a historical shot
    pub fn find_for_record(
        &self,
        record: &HistoricalShotRecord,
    ) -> Result<SimulatedPath, RetrievalError> {
        let class = record
            .shot_class()
            .ok_or_else(|| RetrievalError::UnknownShotTag {
                tag: record.shot_full.clone(),
            })?;
        self.find_most_similar(
            record.from.x,
            record.from.y,
            record.target.x,
            record.target.y,
            class,
        )
    }
}
