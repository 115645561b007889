// Trisieve CLI - Command-line front end
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Trisieve CLI
//!
//! Runs one engine stage per invocation over sequence files.
//!
//! ## Usage
//!
//! ```bash
//! # Every favourable candidate not already in base.txt
//! trisieve generate --base base.txt --positions "31,31,31,31,31,31,31,31,31,31,31,31,31,31" -o pool.txt
//!
//! # Narrow it down
//! trisieve basic -i pool.txt -o basic.txt --cond WIN_COUNT:5:7 --cond LOSS_COUNT:0:3
//! trisieve mask -i basic.txt -o masked.txt -m masks.txt --mode exclude
//! trisieve mystic -i masked.txt -o final.txt --anchors 5 --auto
//!
//! # Write Prometheus metrics of the run
//! trisieve --metrics-out run.prom stats -i final.txt -o stats.csv
//! ```

mod commands;
mod error;
mod export;
mod metrics;

use clap::{Parser, Subcommand};
use commands::{
    BasicArgs, GenerateArgs, MaskArgs, MysticArgs, PreviewArgs, StatsArgs, SuggestArgs, SynthArgs,
};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// Trisieve outcome sequence generator and filter
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Write Prometheus metrics to this file on exit
    #[arg(long, global = true)]
    metrics_out: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate every new candidate allowed by the selector
    Generate(GenerateArgs),
    /// Keep sequences whose features fall inside ranges
    Basic(BasicArgs),
    /// Keep or exclude sequences matching a mask list
    Mask(MaskArgs),
    /// Run the anchor, tolerance and shrink stages
    Mystic(MysticArgs),
    /// Print suggested mystic parameters for a set
    Suggest(SuggestArgs),
    /// Print a random sample of a set
    Preview(PreviewArgs),
    /// Export frequency statistics of a set
    Stats(StatsArgs),
    /// Write a synthetic pool and its manifest
    Synth(SynthArgs),
}

async fn run(args: Args) -> error::Result<()> {
    let mut session = commands::new_session(args.config.as_deref())?;

    match &args.command {
        Command::Generate(a) => commands::generate(&mut session, a).await?,
        Command::Basic(a) => commands::basic(&mut session, a)?,
        Command::Mask(a) => commands::mask(&mut session, a)?,
        Command::Mystic(a) => commands::mystic(&mut session, a)?,
        Command::Suggest(a) => commands::suggest(&mut session, a)?,
        Command::Preview(a) => commands::preview(&mut session, a)?,
        Command::Stats(a) => commands::stats(&mut session, a)?,
        Command::Synth(a) => commands::synth(a)?,
    }

    if let Some(path) = &args.metrics_out {
        metrics::write_metrics(path)?;
        info!("Metrics written to {}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Trisieve v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
