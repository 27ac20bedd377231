//! Trajectory database
//!
//! Offline, the corpus builder simulates random legal shots and buckets every
//! reachable sample by shot class into one k-d tree per class. Online, the
//! retriever answers (origin, destination, class) queries against those trees.

pub mod classify;
pub mod corpus;
pub mod kdtree;
pub mod retrieve;

pub use classify::{ShotClass, classify_next_stage};
pub use corpus::{
    IndexEntry, IndexKey, RandomShot, ShotIndices, build_indices, generate_corpus, generate_path,
    harvest, index_key, random_shot, slot_rng,
};
pub use kdtree::{KdPoint, KdTree};
pub use retrieve::{PathDatabase, RetrievalError};
