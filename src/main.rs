//! Padel PathDB CLI
//!
//! Builds the trajectory database, answers similarity queries and replays
//! game situations from historical match data.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec3;

use padel_pathdb::pathdb::{PathDatabase, ShotClass};
use padel_pathdb::sim::{Court, Table, seeded_rng, simulate_path};
use padel_pathdb::{PathDbConfig, floor_point, persistence, records, situation};

#[derive(Parser)]
#[command(name = "padel-pathdb")]
#[command(about = "Padel ball simulator and trajectory database", long_about = None)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(long, default_value = PathDbConfig::FILE_NAME)]
    config: PathBuf,

    /// Override the data directory from the configuration
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the database, generating it if it is missing or corrupted
    Generate {
        /// Number of paths to generate
        #[arg(long)]
        size: Option<usize>,

        /// Generator seed
        #[arg(long)]
        seed: Option<u64>,

        /// Regenerate even if a valid database exists
        #[arg(long, default_value = "false")]
        force: bool,

        /// Write the effective configuration back to the config file
        #[arg(long, default_value = "false")]
        save_config: bool,
    },

    /// Simulate one shot and report whether it is legal
    #[command(allow_negative_numbers = true)]
    Simulate {
        /// Origin x y z (m)
        #[arg(num_args = 3, required = true, value_names = ["X", "Y", "Z"])]
        origin: Vec<f32>,

        /// Velocity x y z (m/s)
        #[arg(long, num_args = 3, required = true)]
        velocity: Vec<f32>,

        /// Spin x y z (rad/s)
        #[arg(long, num_args = 3)]
        spin: Option<Vec<f32>>,

        /// Seed for grid noise
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Find the stored path most similar to a shot
    #[command(allow_negative_numbers = true)]
    Query {
        from_x: f32,
        from_z: f32,
        target_x: f32,
        target_z: f32,

        /// Shot class name (e.g. side_bounce) or historical shot tag (e.g. DPA)
        #[arg(long, value_parser = parse_class)]
        class: ShotClass,

        /// Print the whole path as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Replay a random pair of consecutive shots from the match records
    Situation {
        /// Match records CSV (defaults to the configured one)
        #[arg(long)]
        records: Option<PathBuf>,

        /// Seed for record selection and grid noise
        #[arg(long, default_value = "0")]
        seed: u64,
    },
}

fn parse_class(s: &str) -> Result<ShotClass, String> {
    ShotClass::from_name(s)
        .or_else(|| ShotClass::from_shot_tag(s))
        .ok_or_else(|| format!("unknown shot class or tag '{s}'"))
}

fn vec3(values: &[f32]) -> Vec3 {
    match values {
        [x, y, z] => Vec3::new(*x, *y, *z),
        _ => Vec3::ZERO,
    }
}

fn load_database(config: &PathDbConfig, court: &Court) -> PathDatabase {
    persistence::load_or_generate(
        &config.data_dir,
        court,
        &config.physics,
        config.corpus_size,
        config.seed,
    )
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = PathDbConfig::load(&cli.config);
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let court = Court::standard();

    match cli.command {
        Commands::Generate {
            size,
            seed,
            force,
            save_config,
        } => {
            if let Some(size) = size {
                config.corpus_size = size;
            }
            if let Some(seed) = seed {
                config.seed = seed;
            }
            if save_config {
                config.save(&cli.config).with_context(|| {
                    format!("Failed to write configuration to {}", cli.config.display())
                })?;
            }

            let db = if force {
                let db = PathDatabase::generate(
                    &court,
                    &config.physics,
                    config.corpus_size,
                    config.seed,
                );
                persistence::save(&config.data_dir, &db).with_context(|| {
                    format!("Failed to save database to {}", config.data_dir.display())
                })?;
                db
            } else {
                load_database(&config, &court)
            };

            println!("Paths: {}", db.len());
            for (class, tree) in db.indices().iter() {
                println!("  {:<18} {:>8} samples", class.name(), tree.len());
            }
        }

        Commands::Simulate {
            origin,
            velocity,
            spin,
            seed,
        } => {
            let spin = spin.as_deref().map(vec3).unwrap_or(Vec3::ZERO);
            let result = simulate_path(
                &court,
                &config.physics,
                &mut seeded_rng(seed),
                vec3(&origin),
                vec3(&velocity),
                spin,
            );
            match result {
                Ok(path) => {
                    println!(
                        "Legal shot: {} samples, {:.2}s",
                        path.coordinates.len(),
                        path.duration()
                    );
                    for (index, contact) in &path.contacts {
                        println!("  contact at sample {index}: {contact}");
                    }
                }
                Err(violation) => println!("{violation}"),
            }
        }

        Commands::Query {
            from_x,
            from_z,
            target_x,
            target_z,
            class,
            json,
        } => {
            let db = load_database(&config, &court);
            let path = db.find_most_similar(from_x, from_z, target_x, target_z, class)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&path)?);
            } else {
                println!("Class:    {class}");
                println!("Start:    {}", path.starting_position);
                println!("Velocity: {}", path.starting_velocity);
                println!("Spin:     {}", path.starting_spin);
                println!(
                    "From:     {} -> to {}",
                    floor_point(path.first()),
                    floor_point(path.last())
                );
                println!("Duration: {:.2}s, {} contacts", path.duration(), path.contacts.len());
            }
        }

        Commands::Situation { records: csv, seed } => {
            let csv = csv.unwrap_or_else(|| config.records_csv.clone());
            let rows = records::read_records(&csv)
                .with_context(|| format!("Failed to read match records from {}", csv.display()))?;

            let db = load_database(&config, &court);
            let mut table = Table::new(court, config.physics);
            let situation =
                situation::random_situation(&mut table, &db, &rows, &mut seeded_rng(seed))?;
            println!("{}", serde_json::to_string_pretty(&situation)?);
        }
    }

    Ok(())
}
