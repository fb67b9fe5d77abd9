//! Config command implementation.

use crate::config::CliConfig;
use colored::Colorize;

/// Prints the effective configuration as TOML, or JSON with `--json`.
pub fn execute(config: &CliConfig, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!("{}", "Effective configuration".bold().cyan());
    println!();
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
