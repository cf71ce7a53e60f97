//! Generate a report from an analysis-result JSON file.
//!
//! Usage:
//!   generate_report analysis.json --format markdown --output report.md
//!   generate_report analysis.json --config engine.json --no-forecast
//!
//! Log level via RUST_LOG (default: info for this crate, warn for others).

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plantation_report::report::formatters::backend_for;
use plantation_report::{EngineConfig, Options, ReportEngine, ReportMetadata, ReportRequest};

#[derive(Parser, Debug)]
#[command(name = "generate_report", about = "Assemble a plantation advisory report")]
struct Args {
    /// Analysis-result JSON document
    input: PathBuf,

    /// Engine configuration JSON (falls back to PLANTATION_REPORT_CONFIG, then defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reference standards JSON (overrides the config's standards_path)
    #[arg(long)]
    standards: Option<PathBuf>,

    /// Output format: markdown, json or html
    #[arg(long, default_value = "markdown")]
    format: String,

    /// Output file (stdout when omitted)
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[arg(long, default_value = "Agronomic Analysis Report")]
    title: String,

    /// Report type label, repeatable (e.g. --report-type soil --report-type leaf)
    #[arg(long = "report-type")]
    report_types: Vec<String>,

    #[arg(long)]
    user: Option<String>,

    #[arg(long)]
    no_summary: bool,

    #[arg(long)]
    no_charts: bool,

    #[arg(long)]
    no_forecast: bool,

    #[arg(long)]
    no_references: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plantation_report=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let start = Instant::now();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::from_env()?,
    };
    if let Some(path) = &args.standards {
        config.standards_path = Some(path.clone());
    }

    let backend = backend_for(&args.format)
        .with_context(|| format!("Unsupported output format: {}", args.format))?;

    let engine = ReportEngine::from_config(config)?;

    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read analysis file: {:?}", args.input))?;
    let document: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse analysis JSON: {:?}", args.input))?;

    let options = Options {
        include_summary: !args.no_summary,
        include_charts: !args.no_charts,
        include_forecast: !args.no_forecast,
        include_references: !args.no_references,
    };
    let mut metadata = ReportMetadata::new(args.title).with_report_types(args.report_types);
    if let Some(user) = args.user {
        metadata = metadata.with_user(user);
    }

    let request = ReportRequest::new(document)
        .with_options(options)
        .with_metadata(metadata);
    let report = engine.generate(&request)?;
    let bytes = backend.render(&report)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &bytes).with_context(|| format!("Failed to write report: {:?}", path))?;
            tracing::info!(
                "Wrote {} report ({} sections, {} bytes) to {:?} in {:?}",
                backend.name(),
                report.sections.len(),
                bytes.len(),
                path,
                start.elapsed()
            );
        }
        None => {
            print!("{}", String::from_utf8_lossy(&bytes));
        }
    }

    Ok(())
}
