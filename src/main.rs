//! # chunkmill CLI (`mill`)
//!
//! The `mill` binary drives the corpus ingestion pipeline: it walks a tree
//! of raw source documents, splits each into bounded overlapping chunks,
//! writes one JSON unit per chunk, and records every processed file in a
//! durable registry so unchanged corpora are no-ops.
//!
//! ## Usage
//!
//! ```bash
//! mill --config ./config/mill.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mill run` | Ingest new or changed files under the corpus root |
//! | `mill run --force` | Ignore the registry and reprocess everything |
//! | `mill run --clear` | Wipe the registry only, then exit |
//! | `mill run --reset` | Wipe registry + chunks, then ingest from scratch |
//! | `mill run --workers 8` | Process files in a bounded worker pool |
//! | `mill status` | Show corpus, registry, and chunk sink health |
//!
//! A run exits 0 when it completes, even with per-file failures; only
//! setup-level problems (missing corpus root, unreadable config) exit
//! non-zero.

mod chunker;
mod config;
mod error;
mod extract;
mod identity;
mod ingest;
mod loader;
mod models;
mod progress;
mod registry;
mod sink;
mod status;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::progress::ProgressMode;

/// chunkmill — content-addressed corpus ingestion for retrieval pipelines.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/mill.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "mill",
    about = "chunkmill — content-addressed corpus ingestion for retrieval pipelines",
    version,
    long_about = "chunkmill prepares a corpus for retrieval: it walks a filesystem tree of raw \
    documents (PDF, DOCX, notebooks, source code, plain text), splits each into bounded \
    overlapping chunks, persists one JSON unit per chunk, and keeps a durable registry of \
    processed content so re-running over an unchanged corpus is a no-op."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/mill.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the ingestion pipeline over the corpus root.
    ///
    /// Walks the corpus, skips files whose content digest is already
    /// recorded, loads and chunks the rest, writes one JSON unit per chunk,
    /// and updates the registry. Per-file failures are reported in the run
    /// summary and never abort the run.
    Run {
        /// Ignore the registry — reprocess every file.
        #[arg(long)]
        force: bool,

        /// Wipe the registry only, then exit without ingesting.
        #[arg(long)]
        clear: bool,

        /// Wipe the registry and all materialized chunks, then ingest from
        /// scratch.
        #[arg(long)]
        reset: bool,

        /// Number of files processed in parallel (defaults to run.workers
        /// from the config).
        #[arg(long)]
        workers: Option<usize>,

        /// Progress reporting on stderr: off, human, or json (defaults to
        /// human when stderr is a TTY).
        #[arg(long)]
        progress: Option<String>,
    },

    /// Show corpus, registry, and chunk sink status.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Run {
            force,
            clear,
            reset,
            workers,
            progress,
        } => {
            if clear {
                let mut reg = registry::Registry::load(&cfg.store.registry_path)?;
                reg.clear()?;
                println!("Registry cleared.");
                return Ok(());
            }
            if reset {
                let mut reg = registry::Registry::load(&cfg.store.registry_path)?;
                reg.clear()?;
                sink::ChunkSink::new(&cfg.store.chunks_dir).purge()?;
                println!("Registry and chunk sink cleared.");
            }

            let mode = match progress.as_deref() {
                None => ProgressMode::default_for_tty(),
                Some("off") => ProgressMode::Off,
                Some("human") => ProgressMode::Human,
                Some("json") => ProgressMode::Json,
                Some(other) => anyhow::bail!(
                    "Unknown progress mode: '{}'. Must be off, human, or json.",
                    other
                ),
            };

            let workers = workers.unwrap_or(cfg.run.workers).max(1);
            ingest::run_ingest(&cfg, force, workers, mode.reporter()).await?;
        }
        Commands::Status => {
            status::show_status(&cfg)?;
        }
    }

    Ok(())
}
