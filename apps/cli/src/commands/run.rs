//! Run command implementation.
//!
//! Loads items from an input file, pushes them through a pipeline, cordons it
//! and flushes until everything is written or the retry budget runs out.

use anyhow::{Context, bail};
use clap::Args;
use colored::Colorize;
use sluice_core::{Pipeline, PipelineMetrics};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::CliConfig;
use crate::input::parse_input_file;
use crate::sink::JsonLinesSink;

/// Arguments for `sluice run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input file with items (line-delimited or JSON array)
    #[arg(long)]
    pub input: PathBuf,

    /// Output file, one JSON line per batch
    #[arg(long)]
    pub output: PathBuf,

    /// Items per batch (overrides config file and SLUICE_BATCH_SIZE)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Fail every batch holding an item that contains this text
    #[arg(long)]
    pub fail_on: Option<String>,

    /// Extra flush attempts after a failed batch
    #[arg(long, default_value = "0")]
    pub retries: u32,

    /// Print final metrics as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute run command.
pub async fn execute(args: RunArgs, config: &CliConfig) -> anyhow::Result<()> {
    let mut pipeline_config = config.pipeline.clone();
    if let Some(batch_size) = args.batch_size {
        pipeline_config = pipeline_config.with_batch_size(batch_size);
    }
    pipeline_config.validate()?;

    let items = parse_input_file(&args.input)
        .with_context(|| format!("Failed to load items from {}", args.input.display()))?;
    let total = items.len();

    let sink = JsonLinesSink::create(&args.output, args.fail_on.clone())
        .await
        .with_context(|| format!("Failed to create output file {}", args.output.display()))?;
    let pipeline = Pipeline::builder(sink).config(&pipeline_config).build()?;

    if !args.json {
        println!("{}", "sluice run".bold().cyan());
        println!();
    }
    info!(items = total, batch_size = pipeline.batch_size(), "Starting run");

    pipeline.push_all(items);
    pipeline.cordon(true);

    let mut failures = 0_u32;
    let drained = loop {
        match pipeline.flush().await {
            Ok(()) => break true,
            Err(err) => {
                failures += 1;
                eprintln!("{} {}", "error:".red().bold(), err);
                if failures > args.retries {
                    break false;
                }
                warn!(attempt = failures, retries = args.retries, "Retrying flush");
            }
        }
    };

    let metrics = pipeline.metrics();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print_summary(total, &metrics, &args);
    }

    if !drained {
        bail!("Pipeline could not be drained: {} items still pending", metrics.pending);
    }
    Ok(())
}

fn print_summary(total: usize, metrics: &PipelineMetrics, args: &RunArgs) {
    println!("  Items:     {}", total);
    println!("  Batches:   {}", metrics.batches_succeeded);
    println!("  Failures:  {}", metrics.batches_failed);
    println!("  Processed: {}", metrics.items_processed);
    println!("  Output:    {}", args.output.display());
    println!();

    if metrics.is_flushed() {
        println!("{}", "All items written".green());
    } else {
        println!("{}", format!("{} items not written", metrics.pending).yellow());
    }
}
