//! Offline corpus generation and per-class index building
//!
//! Every corpus slot owns an RNG derived from (seed, slot) and retries random
//! shots until one passes the legality checks, so the generated corpus does
//! not depend on how rayon schedules the slots. Harvesting the index keys and
//! building the trees happens afterwards, sequentially, in slot order.

use glam::{Vec2, Vec3, Vec4};
use log::{debug, info};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::classify::ShotClass;
use super::kdtree::KdTree;
use crate::consts::{REACHABLE_MAX_HEIGHT, REACHABLE_MIN_HEIGHT};
use crate::floor_point;
use crate::sim::{
    PhysicsParameters, SimRng, SimulatedPath, SurfaceProvider, seeded_rng, simulate_path,
};

/// Index key: (originX, originZ, destinationX, destinationZ)
pub type IndexKey = Vec4;

/// One (key, corpus index) entry per reachable sample
pub type IndexEntry = (IndexKey, usize);

/// Build an index key from a floor-plane origin and destination
#[inline]
pub fn index_key(origin: Vec2, destination: Vec2) -> IndexKey {
    Vec4::new(origin.x, origin.y, destination.x, destination.y)
}

/// Start conditions of a randomly proposed shot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomShot {
    pub position: Vec3,
    pub velocity: Vec3,
    pub spin: Vec3,
}

/// Propose a shot from anywhere on court, hit towards the other half
pub fn random_shot<R: Rng + ?Sized>(rng: &mut R) -> RandomShot {
    let position = Vec3::new(
        rng.random_range(-4.5..4.5),
        rng.random_range(0.3..2.0),
        rng.random_range(-9.5..9.5),
    );
    let velocity = Vec3::new(
        rng.random_range(-6.0..6.0),
        rng.random_range(-0.5..6.0),
        -position.z.signum() * rng.random_range(5.0..12.0),
    );
    let spin = Vec3::new(
        rng.random_range(-5.0..5.0),
        rng.random_range(-5.0..5.0),
        rng.random_range(-5.0..5.0),
    );
    RandomShot {
        position,
        velocity,
        spin,
    }
}

/// RNG for one corpus slot
pub fn slot_rng(seed: u64, slot: usize) -> SimRng {
    seeded_rng(seed ^ (slot as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Keep proposing random shots until one is legal
pub fn generate_path<S, R>(surfaces: &S, params: &PhysicsParameters, rng: &mut R) -> SimulatedPath
where
    S: SurfaceProvider + ?Sized,
    R: Rng + ?Sized,
{
    loop {
        let shot = random_shot(rng);
        match simulate_path(surfaces, params, rng, shot.position, shot.velocity, shot.spin) {
            Ok(path) => return path,
            Err(violation) => debug!("Discarded random shot: {violation}"),
        }
    }
}

/// Generate `size` legal paths in parallel
pub fn generate_corpus<S>(
    surfaces: &S,
    params: &PhysicsParameters,
    size: usize,
    seed: u64,
) -> Vec<SimulatedPath>
where
    S: SurfaceProvider + Sync + ?Sized,
{
    info!("Generating corpus of {size} paths (seed {seed})");
    (0..size)
        .into_par_iter()
        .map(|slot| generate_path(surfaces, params, &mut slot_rng(seed, slot)))
        .collect()
}

/// The six per-class k-d trees, indexed by `ShotClass::index()`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShotIndices([KdTree<IndexKey, usize>; ShotClass::COUNT]);

impl ShotIndices {
    pub fn from_trees(trees: [KdTree<IndexKey, usize>; ShotClass::COUNT]) -> Self {
        Self(trees)
    }

    #[inline]
    pub fn get(&self, class: ShotClass) -> &KdTree<IndexKey, usize> {
        &self.0[class.index()]
    }

    /// (class, tree) pairs in class order
    pub fn iter(&self) -> impl Iterator<Item = (ShotClass, &KdTree<IndexKey, usize>)> {
        ShotClass::ALL.into_iter().zip(self.0.iter())
    }

    /// Total number of entries across all classes
    pub fn total_len(&self) -> usize {
        self.0.iter().map(KdTree::len).sum()
    }

    /// Largest corpus index referenced by any tree
    pub fn max_payload(&self) -> Option<usize> {
        self.0
            .iter()
            .flat_map(|tree| tree.iter().map(|(_, &index)| index))
            .max()
    }
}

/// Append the index entries of one path to the per-class accumulators
pub fn harvest(
    path: &SimulatedPath,
    corpus_index: usize,
    accumulators: &mut [Vec<IndexEntry>; ShotClass::COUNT],
) {
    let origin = floor_point(path.first());
    let mut stage = ShotClass::NoBounce;

    for (i, &position) in path.coordinates.iter().enumerate() {
        if let Some(&contact) = path.contacts.get(&i) {
            stage = stage.next_stage(contact);
        }

        // Only samples a player could reach with the racket
        if (REACHABLE_MIN_HEIGHT..=REACHABLE_MAX_HEIGHT).contains(&position.y) {
            let key = index_key(origin, floor_point(position));
            accumulators[stage.index()].push((key, corpus_index));
        }
    }
}

/// Build all six indices over a corpus
pub fn build_indices(corpus: &[SimulatedPath]) -> ShotIndices {
    let mut accumulators: [Vec<IndexEntry>; ShotClass::COUNT] = Default::default();
    for (index, path) in corpus.iter().enumerate() {
        harvest(path, index, &mut accumulators);
    }

    for class in ShotClass::ALL {
        info!(
            "Building {class} index over {} samples",
            accumulators[class.index()].len()
        );
    }

    ShotIndices(accumulators.map(KdTree::build))
}
