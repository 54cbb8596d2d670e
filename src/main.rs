//! CLI entry point for the flight delay statistics tool.
//!
//! Provides subcommands for summarizing a flight dataset in the log and for
//! exporting the aggregated views to disk and S3.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flight_delay_stats::analyzers::report::build_report;
use flight_delay_stats::analyzers::types::FlightReport;
use flight_delay_stats::analyzers::writetos3::publish_report;
use flight_delay_stats::{
    cache::TableCache,
    config::AnalysisConfig,
    output::{print_json, print_pretty, write_report},
    source::Source,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "flight_delay_stats")]
#[command(about = "Aggregate flight delay statistics from a CSV dataset", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a dataset and log its aggregated views
    Summary {
        /// Path or URL of the flight CSV (may be .gz)
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Minimum populated cells per route-matrix row and column
        #[arg(short = 't', long)]
        route_threshold: Option<usize>,

        /// Log the full report as JSON instead of debug output
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Load a dataset and write its aggregated views to disk, optionally to S3
    Export {
        /// Path or URL of the flight CSV (may be .gz)
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Directory to write report.json and per-view CSVs into
        #[arg(short, long, default_value = "aggregates")]
        output_dir: String,

        /// Minimum populated cells per route-matrix row and column
        #[arg(short = 't', long)]
        route_threshold: Option<usize>,

        /// Optional: S3 bucket name to publish JSON views to (e.g., "my-bucket")
        #[arg(long)]
        s3_bucket: Option<String>,

        /// Key prefix for published objects
        #[arg(long, default_value = "aggregates")]
        s3_prefix: String,

        /// Optional: Gzip compress JSON objects before uploading to S3
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/flight_delay_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("flight_delay_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let cache = TableCache::new();

    match cli.command {
        Commands::Summary {
            source,
            route_threshold,
            json,
        } => {
            let config = AnalysisConfig::from_env()?.with_route_threshold(route_threshold);
            let report = load_report(&cache, &source, &config).await?;

            log_summary(&report);
            if json {
                print_json(&report)?;
            } else {
                print_pretty(&report);
            }
        }
        Commands::Export {
            source,
            output_dir,
            route_threshold,
            s3_bucket,
            s3_prefix,
            gzip,
        } => {
            let config = AnalysisConfig::from_env()?.with_route_threshold(route_threshold);
            let report = load_report(&cache, &source, &config).await?;

            write_report(Path::new(&output_dir), &report)?;

            match s3_bucket {
                Some(bucket) if !bucket.is_empty() => {
                    info!(bucket = %bucket, gzip, "S3 upload enabled");
                    let aws = aws_config::load_from_env().await;
                    let s3 = aws_sdk_s3::Client::new(&aws);
                    publish_report(&s3, &bucket, &s3_prefix, &report, gzip)
                        .await
                        .context("failed to publish report to S3")?;
                }
                _ => info!("S3 bucket not specified, skipping upload"),
            }
        }
    }

    Ok(())
}

/// Loads `raw_source` through the cache and computes every view over it.
#[tracing::instrument(skip(cache, config), fields(source = %raw_source))]
async fn load_report(
    cache: &TableCache,
    raw_source: &str,
    config: &AnalysisConfig,
) -> Result<FlightReport> {
    let source = Source::parse(raw_source);
    let table = cache.get_or_load(&source).await?;
    build_report(table, config, &source.key().to_string()).await
}

/// Logs the headline numbers of a report.
fn log_summary(report: &FlightReport) {
    info!(
        source = %report.source,
        total_flights = report.total_flights,
        carriers = report.carrier_volume.len(),
        "Flight dataset summary"
    );

    for carrier in &report.carrier_volume {
        info!(carrier = %carrier.carrier, flights = carrier.flight_count, "Carrier volume");
    }

    for reason in &report.cancellation_reasons {
        info!(reason = %reason.reason, count = reason.count, "Cancellation reason");
    }

    info!(
        origins = report.route_delays.origins.len(),
        destinations = report.route_delays.destinations.len(),
        threshold = report.route_density_threshold,
        "Route delay matrix"
    );

    for airport in &report.airport_delays {
        info!(
            iata = %airport.iata,
            avg_delay = airport.avg_delay,
            latitude = airport.latitude,
            longitude = airport.longitude,
            "Airport delay"
        );
    }

    for month in &report.monthly_delays {
        info!(
            month = %month.month,
            flights = month.flights,
            delayed = month.delayed,
            delay_rate_pct = month.delay_rate_pct,
            "Monthly delay rate"
        );
    }

    for cause in &report.delay_causes {
        info!(cause = ?cause.cause, minutes = cause.minutes, "Delay cause minutes");
    }
}
