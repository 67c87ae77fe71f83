//! Batch command - route many documents in one run.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::warn;

use scanroute_core::routing::is_supported;
use scanroute_core::{scan_candidates, BatchReport, Classification, Preview, ScanrouteConfig};

use super::process::pipeline_for;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob of files to route (default: everything in the scan folder)
    #[arg(short, long)]
    input: Option<String>,

    /// Classify without moving anything
    #[arg(long)]
    dry_run: bool,

    /// Write a CSV summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,
}

/// One line of the CSV summary.
#[derive(Debug, Serialize, PartialEq)]
pub struct SummaryRow {
    pub source: String,
    pub classification: &'static str,
    pub name: Option<String>,
    pub account: Option<String>,
    pub destination: String,
    pub committed: bool,
    pub processing_time_ms: Option<u64>,
}

fn kind_of(classification: &Classification) -> &'static str {
    match classification {
        Classification::Fully { .. } => "fully",
        Classification::Partial { .. } => "partial",
        Classification::Failed => "failed",
    }
}

/// Files matching `pattern` that the pipeline accepts, sorted.
pub fn expand_glob(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .filter(|p| p.file_name().and_then(|n| n.to_str()).is_some_and(is_supported))
        .collect();
    files.sort();
    Ok(files)
}

pub fn report_rows(report: &BatchReport) -> Vec<SummaryRow> {
    let routed = report.reports.iter().map(|r| SummaryRow {
        source: r.source.display().to_string(),
        classification: kind_of(&r.classification),
        name: r.name.as_ref().map(|m| m.value.clone()),
        account: r.account.as_ref().map(|m| m.value.clone()),
        destination: r
            .final_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        committed: r.committed,
        processing_time_ms: Some(r.processing_time_ms),
    });
    let abandoned = report.abandoned.iter().map(|p| abandoned_row(p));
    routed.chain(abandoned).collect()
}

fn abandoned_row(source: &Path) -> SummaryRow {
    SummaryRow {
        source: source.display().to_string(),
        classification: "abandoned",
        name: None,
        account: None,
        destination: String::new(),
        committed: false,
        processing_time_ms: None,
    }
}

pub fn preview_row(source: &Path, preview: &Preview) -> SummaryRow {
    SummaryRow {
        source: source.display().to_string(),
        classification: kind_of(&preview.decision.classification),
        name: preview.fields.name.as_ref().map(|m| m.value.clone()),
        account: preview.fields.account.as_ref().map(|m| m.value.clone()),
        destination: format!(
            "{}/{}",
            preview.decision.destination.as_str(),
            preview.decision.desired_filename
        ),
        committed: false,
        processing_time_ms: None,
    }
}

pub fn write_summary(path: &Path, rows: &[SummaryRow]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn progress_bar(len: usize) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    Ok(pb)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Classify every file without moving anything.
fn preview_files(files: &[PathBuf], config: &ScanrouteConfig, stop: &AtomicBool) -> anyhow::Result<Vec<SummaryRow>> {
    let pipeline = pipeline_for(config);
    let pb = progress_bar(files.len())?;
    let mut rows = Vec::with_capacity(files.len());

    for path in files {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        pb.set_message(file_label(path));
        match pipeline.preview(path) {
            Ok(preview) => rows.push(preview_row(path, &preview)),
            Err(e) => {
                warn!("Cannot read {}: {}", path.display(), e);
                rows.push(abandoned_row(path));
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");
    Ok(rows)
}

/// Route every file through the pipeline's batch loop.
fn route_files(files: &[PathBuf], config: &ScanrouteConfig, stop: &AtomicBool) -> anyhow::Result<Vec<SummaryRow>> {
    let pipeline = pipeline_for(config);
    let pb = progress_bar(files.len())?;

    let report = pipeline.run_batch_with(files, stop, |path| {
        pb.set_message(file_label(path));
        pb.inc(1);
    });
    pb.finish_with_message("done");

    if report.stopped_early {
        println!("{} Interrupted, remaining files left in place", style("!").yellow());
    }
    Ok(report_rows(&report))
}

pub async fn run(args: BatchArgs, config: ScanrouteConfig) -> anyhow::Result<()> {
    let start = Instant::now();

    let files = match &args.input {
        Some(pattern) => expand_glob(pattern)?,
        None => scan_candidates(&config.paths.scan_dir)?,
    };
    if files.is_empty() {
        println!("{} No documents to process", style("ℹ").blue());
        return Ok(());
    }
    println!("{} Found {} documents", style("ℹ").blue(), files.len());

    if !args.dry_run {
        config.paths.ensure_dirs()?;
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stop.store(true, Ordering::Relaxed);
            }
        });
    }

    let dry_run = args.dry_run;
    let rows = {
        let stop = stop.clone();
        tokio::task::spawn_blocking(move || {
            if dry_run {
                preview_files(&files, &config, &stop)
            } else {
                route_files(&files, &config, &stop)
            }
        })
        .await??
    };

    if let Some(path) = &args.summary {
        write_summary(path, &rows)?;
        println!("{} Summary written to {}", style("✓").green(), path.display());
    }

    let count = |kind: &str| rows.iter().filter(|r| r.classification == kind).count();
    println!();
    println!(
        "{} {} {} documents in {:.1}s",
        style("✓").green(),
        if dry_run { "Classified" } else { "Routed" },
        rows.len(),
        start.elapsed().as_secs_f64()
    );
    println!("  Fully indexed:     {}", count("fully"));
    println!("  Partially indexed: {}", count("partial"));
    println!("  Failed:            {}", count("failed"));
    if count("abandoned") > 0 {
        println!("  {}         {}", style("Abandoned:").red(), count("abandoned"));
    }
    Ok(())
}
