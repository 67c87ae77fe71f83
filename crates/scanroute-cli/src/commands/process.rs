//! Process command - classify a single document, optionally routing it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use console::style;
use tracing::info;

use scanroute_core::routing::is_supported;
use scanroute_core::{
    Classification, FieldMatch, Pipeline, ScanrouteConfig, TesseractExtractor, TextExtractor,
};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Move the file into its destination folder instead of only reporting
    #[arg(long)]
    commit: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

/// Check that a path can be handed to the pipeline.
pub fn check_input(path: &Path) -> anyhow::Result<()> {
    if !path.is_file() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if !is_supported(name) {
        anyhow::bail!("Unsupported file format: {}", path.display());
    }
    Ok(())
}

pub fn pipeline_extractor(config: &ScanrouteConfig) -> Arc<dyn TextExtractor> {
    Arc::new(TesseractExtractor::new(config.ocr.clone()))
}

pub fn pipeline_for(config: &ScanrouteConfig) -> Pipeline {
    Pipeline::new(config, pipeline_extractor(config))
}

fn field_line(label: &str, field: &Option<FieldMatch>) -> String {
    match field {
        Some(m) => format!("{:<10} {} (after \"{}\")", label, m.value, m.label.text),
        None => format!("{:<10} {}", label, style("-").dim()),
    }
}

fn describe(classification: &Classification) -> String {
    match classification {
        Classification::Fully { .. } => style("fully indexed").green().to_string(),
        Classification::Partial { .. } => style("partially indexed").yellow().to_string(),
        Classification::Failed => style("failed").red().to_string(),
    }
}

pub async fn run(args: ProcessArgs, config: ScanrouteConfig) -> anyhow::Result<()> {
    check_input(&args.input)?;
    info!("Processing file: {}", args.input.display());

    let pipeline = pipeline_for(&config);

    if args.commit {
        config.paths.ensure_dirs()?;
        let input = args.input.clone();
        let report = tokio::task::spawn_blocking(move || pipeline.process_file(&input)).await??;

        match args.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text => {
                println!("{}", field_line("Name", &report.name));
                println!("{}", field_line("Account", &report.account));
                println!("{:<10} {}", "Result", describe(&report.classification));
                match &report.final_path {
                    Some(path) => println!("{:<10} {}", "Moved to", path.display()),
                    None => println!("{:<10} {}", "Moved to", style("not moved").red()),
                }
            }
        }
        return Ok(());
    }

    let input = args.input.clone();
    let preview = tokio::task::spawn_blocking(move || pipeline.preview(&input)).await??;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&preview)?),
        OutputFormat::Text => {
            println!("{}", field_line("Name", &preview.fields.name));
            println!("{}", field_line("Account", &preview.fields.account));
            println!("{:<10} {}", "Result", describe(&preview.decision.classification));
            println!(
                "{:<10} {}/{}",
                "Would go",
                preview.decision.destination.as_str(),
                preview.decision.desired_filename
            );
        }
    }
    Ok(())
}
