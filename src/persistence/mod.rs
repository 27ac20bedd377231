//! Save/load of the path database
//!
//! Layout of a data directory:
//! - `paths.json`: the corpus, `{ "paths": [...] }`
//! - `<class>.kdtree.json`: one serialized k-d tree per shot class
//!
//! Files are written to a temporary sibling and renamed into place. Loading
//! checks that every index entry points into the corpus; a directory that
//! cannot be loaded for any reason is regenerated from scratch.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pathdb::{IndexKey, KdTree, PathDatabase, ShotClass, ShotIndices};
use crate::sim::{PhysicsParameters, SimulatedPath, SurfaceProvider};

/// Corpus file name inside the data directory
pub const PATHS_FILE: &str = "paths.json";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed corpus: {reason}")]
    MalformedCorpus { reason: String },
}

/// Index file name for a shot class
pub fn index_file_name(class: ShotClass) -> String {
    format!("{}.kdtree.json", class.name())
}

#[derive(Serialize)]
struct PathFileRef<'a> {
    paths: &'a [SimulatedPath],
}

#[derive(Deserialize)]
struct PathFile {
    paths: Vec<SimulatedPath>,
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistError> {
    let tmp = temp_path(path);
    let mut writer = BufWriter::new(File::create(&tmp)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    drop(writer);
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PersistError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Write the corpus and all six indices to `dir`
pub fn save(dir: &Path, db: &PathDatabase) -> Result<(), PersistError> {
    fs::create_dir_all(dir)?;

    write_json(&dir.join(PATHS_FILE), &PathFileRef { paths: db.paths() })?;
    for (class, tree) in db.indices().iter() {
        write_json(&dir.join(index_file_name(class)), tree)?;
    }

    info!("Saved {} paths to {}", db.len(), dir.display());
    Ok(())
}

/// Read a database previously written with [`save`]
pub fn load(dir: &Path) -> Result<PathDatabase, PersistError> {
    let paths = read_json::<PathFile>(&dir.join(PATHS_FILE))?.paths;

    let mut trees: [KdTree<IndexKey, usize>; ShotClass::COUNT] = Default::default();
    for class in ShotClass::ALL {
        trees[class.index()] = read_json(&dir.join(index_file_name(class)))?;
    }
    let indices = ShotIndices::from_trees(trees);

    validate(&paths, &indices)?;
    Ok(PathDatabase::new(paths, indices))
}

fn validate(paths: &[SimulatedPath], indices: &ShotIndices) -> Result<(), PersistError> {
    if let Some(i) = paths.iter().position(|p| p.coordinates.is_empty()) {
        return Err(PersistError::MalformedCorpus {
            reason: format!("path {i} has no samples"),
        });
    }

    if let Some(max) = indices.max_payload() {
        if max >= paths.len() {
            return Err(PersistError::MalformedCorpus {
                reason: format!(
                    "index refers to path {max} but the corpus holds {}",
                    paths.len()
                ),
            });
        }
    }
    Ok(())
}

/// Load the database from `dir`, or generate and save a new one if that
/// fails. A missing directory and a corrupted one are treated the same.
pub fn load_or_generate<S>(
    dir: &Path,
    surfaces: &S,
    params: &PhysicsParameters,
    corpus_size: usize,
    seed: u64,
) -> PathDatabase
where
    S: SurfaceProvider + Sync + ?Sized,
{
    match load(dir) {
        Ok(db) => {
            info!("Loaded {} paths from {}", db.len(), dir.display());
            db
        }
        Err(e) => {
            warn!(
                "Could not load path database from {} ({e}), regenerating",
                dir.display()
            );
            let db = PathDatabase::generate(surfaces, params, corpus_size, seed);
            if let Err(e) = save(dir, &db) {
                warn!("Failed to save path database: {e}");
            }
            db
        }
    }
}
