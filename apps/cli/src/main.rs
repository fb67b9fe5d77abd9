//! Sluice CLI - push items from a file through a batching pipeline
//!
//! This CLI provides a `sluice` command that loads items, batches them with
//! `sluice-core` and writes each batch as one JSON line.

mod commands;
mod config;
mod input;
mod sink;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::run::RunArgs;

/// Sluice - ordered, one-at-a-time batch processing
#[derive(Parser, Debug)]
#[command(name = "sluice", author, version, about = "Sluice - ordered batch processing of file items")]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Config file (defaults to ./sluice.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Push every item of an input file through the pipeline
    ///
    /// Items are batched in file order and each successful batch is appended
    /// to the output file as one JSON line.
    Run(RunArgs),

    /// Show the effective configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut cli_config = config::CliConfig::discover_and_load(args.config.as_deref())?;
    if let Some(level) = args.log_level {
        cli_config.log_level = Some(level);
    }

    let level = match cli_config.log_level.as_deref().unwrap_or("info") {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Run(run_args) => commands::run::execute(run_args, &cli_config).await,
        Command::Config { json } => commands::config::execute(&cli_config, json),
    }
}
