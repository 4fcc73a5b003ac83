//! `artrack` – replay AR-tag tracker recordings through the perception module.
//!
//! 1. Loads `~/.artrack/config.toml` (or `--config`), applying `ARTRACK_*`
//!    environment overrides.
//! 2. Loads a JSON scenario and its ontology.
//! 3. Runs every recorded cycle through
//!    [`ArTrackPerception`][artrack_perception::ArTrackPerception] and prints
//!    the per-cycle outcome and the resulting world model.

mod config;
mod error;
mod scenario;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use artrack_perception::{CycleOutcome, Percept, SkipReason};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use crate::error::CliError;
use crate::scenario::{Module, Scenario};

/// Replay AR-tag tracker recordings into a world model.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the config file (defaults to ~/.artrack/config.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a recorded scenario through the perception module.
    Replay {
        /// JSON scenario file.
        #[arg(short, long)]
        scenario: PathBuf,

        /// Ontology file overriding the one named in the scenario.
        #[arg(short, long)]
        ontology: Option<PathBuf>,

        /// Print the final percept table as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write a default config file.
    InitConfig,
}

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG selects the filter (default "info"); ARTRACK_LOG_FORMAT=json
    // switches to newline-delimited JSON.  User-facing output uses println!.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("ARTRACK_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.unwrap_or_else(config::config_path);

    match cli.command {
        Command::InitConfig => {
            config::save_to(&config::Config::default(), &config_path)?;
            println!(
                "  {} Config saved to {}",
                "✓".green().bold(),
                config_path.display().to_string().bold()
            );
            Ok(())
        }
        Command::Replay {
            scenario,
            ontology,
            json,
        } => {
            let mut cfg = match config::load_from(&config_path)? {
                Some(cfg) => {
                    info!(path = %config_path.display(), "config loaded");
                    cfg
                }
                None => config::Config::default(),
            };
            config::apply_env_overrides(&mut cfg);

            let loaded = Scenario::load(&scenario)?;
            let scenario_dir = scenario.parent().unwrap_or(Path::new("."));
            let onto = loaded.build_ontology(scenario_dir, ontology.as_deref())?;

            let (module, outcomes) = scenario::replay(&loaded, onto, cfg.to_module_config());

            if json {
                let table: BTreeMap<&str, &Percept> = module
                    .percepts()
                    .iter()
                    .map(|(id, p)| (id.as_str(), p))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&table)?);
            } else {
                print_outcomes(&outcomes);
                print_world(&module);
            }
            Ok(())
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_outcomes(outcomes: &[CycleOutcome]) {
    println!();
    for (index, outcome) in outcomes.iter().enumerate() {
        match outcome {
            CycleOutcome::Processed(s) => println!(
                "  cycle {:>3}  {}  valid={} rejected={} created={} blacklisted={} updated={} tf_failures={} pois={}",
                index,
                "processed".green(),
                s.valid_observations,
                s.rejected_markers,
                s.percepts_created,
                s.markers_blacklisted,
                s.poses_updated,
                s.transform_failures,
                s.points_of_interest_added,
            ),
            CycleOutcome::Skipped(reason) => {
                let why = match reason {
                    SkipReason::NoAgent => "no robot bound",
                    SkipReason::HeadUnlocated => "head unlocated",
                    SkipReason::HeadMoved => "head moving",
                };
                println!("  cycle {:>3}  {}  ({})", index, "skipped".yellow(), why);
            }
        }
    }
}

fn print_world(module: &Module) {
    println!();
    println!("  {}", "World model".bold());

    let mut ids: Vec<&String> = module.percepts().keys().collect();
    ids.sort();
    if ids.is_empty() {
        println!("    {}", "(no percepts)".dimmed());
    }
    for id in ids {
        let Some(p) = module.percept(id) else {
            continue;
        };
        let seen = if p.is_seen() {
            "seen".green()
        } else {
            format!("unseen x{}", p.frames_unseen()).yellow()
        };
        let pose = match p.pose() {
            Some(pose) => format!(
                "({:.3}, {:.3}, {:.3})",
                pose.position.x, pose.position.y, pose.position.z
            ),
            None => "unlocated".to_string(),
        };
        println!(
            "    • {:<20} {:<28} {:<12} pois={}",
            id.bold(),
            pose,
            seen,
            p.points_of_interest().len()
        );
    }

    let mut blacklisted: Vec<u32> = module.blacklist().iter().copied().collect();
    if !blacklisted.is_empty() {
        blacklisted.sort_unstable();
        println!("    {} {:?}", "blacklisted markers:".dimmed(), blacklisted);
    }
    println!();
}
