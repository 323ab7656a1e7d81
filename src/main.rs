//! oilgen - deterministic oil deposit generation
//!
//! Command-line front end over the deposit generator and a reference world.

mod commands;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{ChunkArg, Region};
use config::AppConfig;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Deterministic oil deposit generator", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// World seed, overriding the configured one
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a class map of the deposits rooted in a chunk region
    Map {
        /// Chunk region as `x0,z0,x1,z1` (inclusive)
        #[arg(short, long, default_value = "-8,-8,8,8", allow_hyphen_values = true)]
        region: Region,
    },
    /// Print the full derivation of the deposit rooted in one chunk as JSON
    Inspect {
        /// Chunk as `x,z`
        #[arg(long, allow_hyphen_values = true)]
        chunk: ChunkArg,
    },
    /// Populate a chunk region of the reference world and report what was written
    Populate {
        /// Chunk region as `x0,z0,x1,z1` (inclusive)
        #[arg(short, long, default_value = "-2,-2,2,2", allow_hyphen_values = true)]
        region: Region,

        /// Write a JSON metrics report to this path
        #[arg(long)]
        metrics: Option<PathBuf>,

        /// Print the per-chunk reports as JSON lines
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Initialize tracing with INFO level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut app = match &cli.config {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    };
    if let Some(seed) = cli.seed {
        app.seed = seed;
    }
    info!(seed = app.seed, "Starting oilgen v{}", env!("CARGO_PKG_VERSION"));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Map { region } => commands::map(&app, region, &mut out),
        Command::Inspect { chunk } => commands::inspect(&app, chunk.0, &mut out),
        Command::Populate {
            region,
            metrics,
            json,
        } => commands::populate(&app, region, metrics.as_deref(), json, &mut out),
    }
    .context("command failed")
}
