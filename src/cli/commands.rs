//! Command implementations for the trip pipeline CLI
//!
//! Contains the command execution logic, quality report rendering, and
//! logging setup for the CLI interface.

use crate::cli::args::{Args, Commands, OutputFormat, ProcessArgs, ReportArgs};
use crate::error::Result;
use crate::models::RunSummary;
use crate::pipeline::Pipeline;
use crate::sink::{NullSink, ParquetDirSink, PartitionSink};
use crate::source::CsvPartitionSource;
use colored::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Main command runner
pub async fn run(args: Args, cancel: CancellationToken) -> Result<RunSummary> {
    match args.command.expect("command presence checked by caller") {
        Commands::Process(process_args) => run_process(process_args, cancel).await,
        Commands::Report(report_args) => run_report(report_args, cancel).await,
    }
}

/// Process partitions into enriched Parquet files
async fn run_process(args: ProcessArgs, cancel: CancellationToken) -> Result<RunSummary> {
    setup_logging(args.get_log_level());

    info!("Starting trip partition processing");
    debug!("Command line arguments: {:?}", args);

    let config = args.to_config()?;
    let pipeline = Pipeline::new(config)?;

    let source = CsvPartitionSource::new(args.input.clone());
    let sink: Arc<dyn PartitionSink> = Arc::new(ParquetDirSink::new(args.output.clone())?);

    if !args.quiet {
        println!("{}", "Starting trip partition processing".bright_green().bold());
        println!("  {} {}", "Input:".bright_cyan(), args.input);
        println!("  {} {}", "Output:".bright_cyan(), args.output.display());
    }

    let summary = pipeline.run(&source, sink, cancel).await?;

    render_summary(&summary, args.output_format, args.quiet);
    Ok(summary)
}

/// Compute the quality report without writing enriched partitions
async fn run_report(args: ReportArgs, cancel: CancellationToken) -> Result<RunSummary> {
    setup_logging(args.get_log_level());

    info!("Starting quality report run");
    debug!("Command line arguments: {:?}", args);

    let config = args.to_config()?;
    let pipeline = Pipeline::new(config)?;

    let source = CsvPartitionSource::new(args.input.clone());
    let sink: Arc<dyn PartitionSink> = Arc::new(NullSink);

    let summary = pipeline.run(&source, sink, cancel).await?;

    render_summary(&summary, args.output_format, args.quiet);
    Ok(summary)
}

/// Set up structured logging based on the CLI verbosity level
fn setup_logging(log_level: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tripgrid={}", log_level)));

    // Ignore a second init; tests may set up their own subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .try_init();

    debug!("Logging initialized at level: {}", log_level);
}

/// Render the run summary in the requested format
fn render_summary(summary: &RunSummary, format: OutputFormat, quiet: bool) {
    match format {
        OutputFormat::Human => {
            if !quiet {
                render_human_summary(summary);
            }
        }
        OutputFormat::Json => render_json_summary(summary),
    }
}

fn render_human_summary(summary: &RunSummary) {
    let stats = &summary.stats;
    let report = &summary.report;

    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}",
        "Partitions processed:".bright_cyan(),
        stats.partitions_processed.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Total rows:".bright_cyan(),
        stats.total_rows.to_string().bright_white().bold()
    );
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    if stats.cancelled {
        println!(
            "  {} {}",
            "Cancelled:".bright_red(),
            "report covers completed partitions only".bright_red().bold()
        );
    }

    println!("\n{}", "Coordinate Validity".bright_green().bold());
    for (flag, quality) in &report.coordinates {
        println!(
            "  {} {} valid ({})",
            format!("{}:", flag).bright_cyan(),
            quality.valid_count.to_string().bright_white(),
            format_percentage(quality.valid_percentage)
        );
    }

    println!("\n{}", "Column Null Rates".bright_green().bold());
    for (column, quality) in &report.columns {
        if quality.null_count == 0 {
            continue;
        }
        println!(
            "  {} {} nulls ({})",
            format!("{}:", column).bright_cyan(),
            quality.null_count.to_string().bright_white(),
            format_percentage(quality.null_percentage)
        );
    }
    println!();
}

fn render_json_summary(summary: &RunSummary) {
    let json = serde_json::json!({
        "stats": summary.stats,
        "report": summary.report,
    });

    println!(
        "{}",
        serde_json::to_string_pretty(&json).expect("summary is serializable")
    );
}

/// Format an optional percentage; undefined on a zero-row dataset
fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(pct) => format!("{:.1}%", pct),
        None => "n/a".to_string(),
    }
}
