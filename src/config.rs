//! Runtime configuration
//!
//! Read from a JSON file; any missing field falls back to its default and a
//! missing or unreadable file falls back to the whole default configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::CORPUS_SIZE;
use crate::sim::PhysicsParameters;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathDbConfig {
    // === Corpus ===
    /// Directory holding the corpus and the per-class indices
    pub data_dir: PathBuf,
    /// Number of paths to generate when the corpus has to be rebuilt
    pub corpus_size: usize,
    /// Seed of the corpus generator
    pub seed: u64,

    // === Simulation ===
    pub physics: PhysicsParameters,

    // === Match data ===
    /// Historical match records used for game situations
    pub records_csv: PathBuf,
}

impl Default for PathDbConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("PathDBData"),
            corpus_size: CORPUS_SIZE,
            seed: 0,

            physics: PhysicsParameters::default(),

            records_csv: PathBuf::from("PathDBData/dataMen.csv"),
        }
    }
}

impl PathDbConfig {
    /// Default config file name, looked up in the working directory
    pub const FILE_NAME: &'static str = "pathdb.json";

    /// Load the configuration, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from {}", path.display());
                    return config;
                }
                Err(e) => log::warn!("Ignoring invalid configuration {}: {e}", path.display()),
            },
            Err(_) => log::info!("No configuration at {}", path.display()),
        }

        log::info!("Using default configuration");
        Self::default()
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), crate::persistence::PersistError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Configuration saved to {}", path.display());
        Ok(())
    }
}
