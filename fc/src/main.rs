//! fchunk - split files into chunks and merge them back
//!
//! CLI entry point.

use std::fs;

use clap::{CommandFactory, Parser};
use colored::*;
use eyre::{Context, Result};
use tracing::{error, info};

use filechunk::cli::{Cli, OutputFormat, Request, normalize_args};
use filechunk::config::{Config, log_path};
use filechunk::{LocalFs, MergeReport, Merger, SplitReport, Splitter, SystemClock};

/// Append to the shared log file so stdout stays clean for reports
fn setup_logging(verbose: bool) -> Result<()> {
    let path = log_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).context("Failed to create log directory")?;
    }
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .context(format!("Failed to open log file {}", path.display()))?;

    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!(verbose, pid = std::process::id(), "fchunk started");
    Ok(())
}

fn print_usage() -> Result<()> {
    Cli::command().print_help()?;
    println!();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    // Nothing on disk is touched, not even the log, when usage is certain
    if cli.missing_required() {
        return print_usage();
    }

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let format = cli.format.unwrap_or(config.output.format);

    match cli.request(&config) {
        Request::Split { source, size_mb } => {
            info!(?source, size_mb = size_mb.get(), "Splitting");
            let splitter = Splitter::new(LocalFs, SystemClock);
            let report = splitter
                .split(&source, size_mb, config.split.output_dir.as_deref())
                .inspect_err(|e| error!(path = ?e.path(), "Split failed: {}", e))
                .context(format!("Failed to split {}", source.display()))?;
            print_split(&report, format)
        }
        Request::Merge { folder, merged } => {
            info!(?folder, ?merged, "Merging");
            let report = Merger::new(LocalFs)
                .merge(&folder, &merged)
                .inspect_err(|e| error!(path = ?e.path(), "Merge failed: {}", e))
                .context(format!("Failed to merge {}", folder.display()))?;
            print_merge(&report, format)
        }
        Request::Usage => {
            info!("No chunk size given or configured, printing usage");
            print_usage()
        }
    }
}

fn print_split(report: &SplitReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => {
            for chunk in &report.chunks {
                let name = chunk.path.file_name().unwrap_or_default().to_string_lossy();
                println!("Created chunk {} with size {}", name.cyan(), chunk.size());
            }
            if report.chunks.is_empty() {
                println!("{} is empty, no chunks written", report.source.display());
            } else {
                println!(
                    "{} Split into {} chunks: {}",
                    "✓".green(),
                    report.chunks.len(),
                    report.group_dir.display()
                );
            }
        }
    }
    Ok(())
}

fn print_merge(report: &MergeReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => {
            for file in &report.files {
                println!("Merging file {}", file.display().to_string().dimmed());
            }
            println!(
                "{} Merged files in {} to {}",
                "✓".green(),
                report.folder.display(),
                report.merged.display().to_string().cyan()
            );
        }
    }
    Ok(())
}
