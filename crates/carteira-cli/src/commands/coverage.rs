//! Coverage command - report which operators and rules are registered.

use clap::{Args, ValueEnum};
use tracing::info;

use carteira_core::CardParser;

use super::config::load_config;

#[derive(Args)]
pub struct CoverageArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: CoverageFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CoverageFormat {
    Json,
    Text,
}

pub fn run(args: CoverageArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let parser = CardParser::from_config(&config.extraction)?;
    let report = parser.coverage();

    info!(
        "Registry covers {} operators with {} rules",
        report.operators.len(),
        report.total_rules()
    );

    match args.format {
        CoverageFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        CoverageFormat::Text => println!("{}", report),
    }

    Ok(())
}
