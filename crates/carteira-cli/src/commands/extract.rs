//! Extract command - extract fields from a single card text.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, ValueEnum};
use console::style;
use tracing::{debug, info};

use carteira_core::{render_trace, CardExtractor, CardParser, CarteiraConfig, ExtractionResult};

use super::config::load_config;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input text file produced by OCR ("-" or omitted reads stdin)
    input: Option<PathBuf>,

    /// Card text given inline instead of a file
    #[arg(short, long, conflicts_with = "input")]
    text: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (default: from config)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Include the rule-by-rule trace
    #[arg(long)]
    trace: bool,

    /// Disable the generic fallback rules
    #[arg(long)]
    no_fallback: bool,

    /// Print the share of fields extracted
    #[arg(long)]
    show_completeness: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// Resolve the format from an explicit flag or the config default.
    pub fn resolve(flag: Option<OutputFormat>, config: &CarteiraConfig) -> anyhow::Result<Self> {
        match flag {
            Some(format) => Ok(format),
            None => OutputFormat::from_str(&config.output.format, true)
                .map_err(|e| anyhow::anyhow!("Invalid output.format in config: {}", e)),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let format = OutputFormat::resolve(args.format, &config)?;
    let include_trace = args.trace || config.output.include_trace;

    let mut parser = CardParser::from_config(&config.extraction)?;
    if args.no_fallback {
        parser = parser.with_generic_fallback(false);
    }

    let text = read_input(&args)?;
    info!("Read {} characters of card text", text.len());

    let result = parser.extract(&text);
    let output = format_result(&result, format, include_trace)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_completeness {
        eprintln!(
            "{} Completeness: {:.0}% ({}/3 fields)",
            style("ℹ").blue(),
            result.completeness() * 100.0,
            result.filled_fields()
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn read_input(args: &ExtractArgs) -> anyhow::Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }

    match &args.input {
        Some(path) if path.as_os_str() != "-" => {
            if !path.exists() {
                anyhow::bail!("Input file not found: {}", path.display());
            }
            Ok(fs::read_to_string(path)?)
        }
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// Render one result in the requested format.
pub fn format_result(
    result: &ExtractionResult,
    format: OutputFormat,
    include_trace: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => format_json(result, include_trace),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result, include_trace)),
    }
}

fn format_json(result: &ExtractionResult, include_trace: bool) -> anyhow::Result<String> {
    if include_trace {
        return Ok(serde_json::to_string_pretty(result)?);
    }

    let fields = ExtractionResult {
        trace: Vec::new(),
        ..result.clone()
    };
    let mut value = serde_json::to_value(&fields)?;
    if let Some(object) = value.as_object_mut() {
        object.remove("trace");
    }
    Ok(serde_json::to_string_pretty(&value)?)
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let completeness = format!("{:.2}", result.completeness());

    wtr.write_record(["operator_name", "card_number", "plan_name", "completeness"])?;
    wtr.write_record([
        result.operator_name.as_deref().unwrap_or_default(),
        result.card_number.as_deref().unwrap_or_default(),
        result.plan_name.as_deref().unwrap_or_default(),
        completeness.as_str(),
    ])?;

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(result: &ExtractionResult, include_trace: bool) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    let mut output = String::new();
    output.push_str(&format!("Operator:     {}\n", field(&result.operator_name)));
    output.push_str(&format!("Card number:  {}\n", field(&result.card_number)));
    output.push_str(&format!("Plan:         {}\n", field(&result.plan_name)));
    output.push_str(&format!(
        "Completeness: {:.0}%\n",
        result.completeness() * 100.0
    ));

    if include_trace && !result.trace.is_empty() {
        output.push_str("\nTrace:\n");
        output.push_str(&render_trace(&result.trace));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExtractionResult {
        carteira_core::extract("UNIMED\nNÚMERO: 1234.5678.9012.3456\nPLANO: FEDERAL EXECUTIVO")
    }

    #[test]
    fn test_json_without_trace() {
        let output = format_result(&sample(), OutputFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["operator_name"], "Unimed");
        assert_eq!(value["completeness"], 1.0);
        assert!(value.get("trace").is_none());
    }

    #[test]
    fn test_json_with_trace() {
        let output = format_result(&sample(), OutputFormat::Json, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(!value["trace"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_csv_and_text() {
        let csv = format_result(&sample(), OutputFormat::Csv, false).unwrap();
        assert!(csv.starts_with("operator_name,card_number,plan_name,completeness\n"));
        assert!(csv.contains("Unimed,1234567890123456,FEDERAL EXECUTIVO,1.00"));

        let text = format_result(&ExtractionResult::default(), OutputFormat::Text, true).unwrap();
        assert!(text.contains("Operator:     -"));
        assert!(text.contains("Completeness: 0%"));
        assert!(!text.contains("Trace:"));
    }

    #[test]
    fn test_format_from_config() {
        let mut config = CarteiraConfig::default();
        config.output.format = "csv".to_string();
        assert_eq!(OutputFormat::resolve(None, &config).unwrap(), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::resolve(Some(OutputFormat::Text), &config).unwrap(),
            OutputFormat::Text
        );
    }
}
