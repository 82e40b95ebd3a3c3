//! Batch processing command for multiple card text files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, error, warn};

use carteira_core::{CardExtractor, CardParser, ExtractionResult};

use super::config::load_config;
use super::extract::{format_result, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for OCR text files (e.g. "cards/*.txt")
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file (default: from config)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Include the rule trace in each output file
    #[arg(long)]
    trace: bool,

    /// Continue when a file cannot be read
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    result: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

/// One row of the summary CSV.
#[derive(Serialize)]
struct SummaryRow<'a> {
    filename: &'a str,
    status: &'a str,
    operator_name: &'a str,
    card_number: &'a str,
    plan_name: &'a str,
    completeness: String,
    processing_time_ms: u64,
    error: &'a str,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let format = OutputFormat::resolve(args.format, &config)?;
    let include_trace = args.trace || config.output.include_trace;
    let parser = CardParser::from_config(&config.extraction)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let outcome = fs::read_to_string(&path).map(|text| parser.extract(&text));
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => results.push(FileResult {
                path,
                result: Some(result),
                error: None,
                processing_time_ms,
            }),
            Err(e) if args.continue_on_error => {
                warn!("Failed to read {}: {}", path.display(), e);
                results.push(FileResult {
                    path,
                    result: None,
                    error: Some(e.to_string()),
                    processing_time_ms,
                });
            }
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                anyhow::bail!("Processing failed for {}: {}", path.display(), e);
            }
        }

        progress.inc(1);
    }

    progress.finish_and_clear();

    if let Some(output_dir) = &args.output_dir {
        for file in &results {
            let Some(result) = &file.result else { continue };
            let stem = file
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("card");
            let output_path = output_dir.join(format!("{}.{}", stem, format.extension()));

            fs::write(&output_path, format_result(result, format, include_trace)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    print_totals(&results, start);

    Ok(())
}

fn print_totals(results: &[FileResult], start: Instant) {
    let extracted: Vec<&ExtractionResult> = results.iter().filter_map(|r| r.result.as_ref()).collect();
    let complete = extracted.iter().filter(|r| r.filled_fields() == 3).count();
    let unidentified = extracted.iter().filter(|r| r.operator_name.is_none()).count();
    let failed: Vec<&FileResult> = results.iter().filter(|r| r.error.is_some()).collect();

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} complete, {} partial, {} unidentified operator, {} failed",
        style(complete).green(),
        style(extracted.len() - complete).yellow(),
        style(unidentified).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for file in &failed {
            eprintln!(
                "  - {}: {}",
                file.path.display(),
                file.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    for file in results {
        let filename = file.path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        let result = file.result.as_ref();

        wtr.serialize(SummaryRow {
            filename,
            status: if result.is_some() { "success" } else { "error" },
            operator_name: result.and_then(|r| r.operator_name.as_deref()).unwrap_or(""),
            card_number: result.and_then(|r| r.card_number.as_deref()).unwrap_or(""),
            plan_name: result.and_then(|r| r.plan_name.as_deref()).unwrap_or(""),
            completeness: result
                .map(|r| format!("{:.2}", r.completeness()))
                .unwrap_or_default(),
            processing_time_ms: file.processing_time_ms,
            error: file.error.as_deref().unwrap_or(""),
        })?;
    }

    wtr.flush()?;
    Ok(())
}
