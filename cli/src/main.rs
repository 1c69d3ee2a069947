//! Clarion CLI - replay recorded clang output through the diagnostics provider.
//!
//! ```text
//! clarion replay <source> <compile-result.json>...
//! ```
//!
//! Every published invalidation and update is written to stdout as one JSON
//! object per line. Logs go to stderr, filtered by `RUST_LOG` or the
//! `[log] filter` entry in `~/.clarion/config.toml`.

mod replay;

use std::io::{Write, stdout};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use clarion_config::ClarionConfig;
use clarion_types::DocumentId;

use crate::replay::{DiskDocument, ReplayEvent, load_results, replay};

#[derive(Parser)]
#[command(name = "clarion")]
#[command(about = "Replay recorded clang results through the diagnostics provider")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file against recorded results, printing events as JSON lines
    Replay {
        /// Source file the results were recorded for
        source: PathBuf,
        /// Recorded compile results: the first answers open, the rest answer saves
        #[arg(required = true)]
        results: Vec<PathBuf>,
    },
}

fn init_tracing(default_filter: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn write_events(out: &mut impl Write, events: &[ReplayEvent]) -> Result<()> {
    for event in events {
        serde_json::to_writer(&mut *out, event).context("failed to encode event")?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ClarionConfig::load();
    let default_filter = config
        .as_ref()
        .ok()
        .and_then(Option::as_ref)
        .and_then(ClarionConfig::log_filter);
    init_tracing(default_filter);

    let config = match config {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(path = %e.path().display(), "Ignoring unusable config: {e}");
            ClarionConfig::default()
        }
    };

    match cli.command {
        Commands::Replay { source, results } => {
            let document = DiskDocument::load(DocumentId::new(1), &source)?;
            let results = load_results(&results)?;
            let events = replay(config.diagnostics_or_default(), document, results).await;
            tracing::info!(count = events.len(), "Replay finished");
            write_events(&mut stdout().lock(), &events)
        }
    }
}
