//! CLI entry point for the taxi trip cleaner.
//!
//! Provides subcommands for cleaning a raw trip export, summarizing the
//! cleaned result without writing it, and inspecting the effective
//! thresholds.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use taxi_trip_cleaner::{
    config::CleaningConfig,
    loader::load_path,
    output::{append_report, print_json, print_pretty, write_dataset, write_json},
    pipeline::{CleanedDataset, CleaningReport, run},
    publish::{object_key, upload_file, write_json_to_s3},
    stats::DatasetSummary,
};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "taxi_trip_cleaner")]
#[command(about = "Clean, derive features for, and flag taxi trip records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a raw trip CSV and write the surviving, feature-augmented rows
    Clean {
        /// Raw trip CSV to read
        #[arg(value_name = "INPUT")]
        input: String,

        /// CSV file to write cleaned trips to
        #[arg(short, long, default_value = "cleaned_trips.csv")]
        output: String,

        /// JSON file overriding the default thresholds
        #[arg(short, long)]
        config: Option<String>,

        /// Abort on the first unparseable row instead of skipping it
        #[arg(long, default_value_t = false)]
        strict: bool,

        /// Optional: CSV file to append a run report to
        #[arg(long)]
        audit_log: Option<String>,

        /// Optional: JSON file to write the dataset summary to
        #[arg(long)]
        summary_json: Option<String>,

        /// Optional: S3 bucket name to upload the cleaned CSV and summary to
        #[arg(long)]
        s3_bucket: Option<String>,

        /// Key prefix for uploaded objects
        #[arg(long, default_value = "cleaned")]
        s3_prefix: String,

        /// Optional: Gzip compress the cleaned CSV before uploading to S3
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Run the pipeline and log the report and summary without writing output
    Summarize {
        /// Raw trip CSV to read
        #[arg(value_name = "INPUT")]
        input: String,

        /// JSON file overriding the default thresholds
        #[arg(short, long)]
        config: Option<String>,

        /// Abort on the first unparseable row instead of skipping it
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Print the effective cleaning thresholds as JSON
    ShowConfig {
        /// JSON file overriding the default thresholds
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/taxi_trip_cleaner.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("taxi_trip_cleaner.log"));

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

    match cli.command {
        Commands::Clean {
            input,
            output,
            config,
            strict,
            audit_log,
            summary_json,
            s3_bucket,
            s3_prefix,
            gzip,
        } => {
            let config = CleaningConfig::load_or_default(config.as_deref())?;
            let (cleaned, report) = clean(&input, &config, strict)?;
            let summary = DatasetSummary::from_records(&cleaned.records);

            write_dataset(&output, &cleaned.records)?;
            info!(output = %output, rows = cleaned.records.len(), "Cleaned dataset written");

            if let Some(ref path) = audit_log {
                append_report(path, &report)?;
            }
            if let Some(ref path) = summary_json {
                write_json(path, &summary)?;
            }

            print_json(&report)?;

            if let Some(ref bucket) = s3_bucket {
                info!(bucket = %bucket, gzip, "S3 upload enabled");
                let aws = aws_config::load_from_env().await;
                let s3 = aws_sdk_s3::Client::new(&aws);

                let output_path = Path::new(&output);
                upload_file(&s3, bucket, &s3_prefix, output_path, gzip).await?;

                let file_name = output_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("cleaned_trips.csv");
                let summary_key =
                    object_key(&s3_prefix, &format!("{file_name}.summary.json"), false);
                write_json_to_s3(&s3, bucket, &summary_key, &summary).await?;
                info!(key = %summary_key, "Summary uploaded to S3");
            }
        }
        Commands::Summarize {
            input,
            config,
            strict,
        } => {
            let config = CleaningConfig::load_or_default(config.as_deref())?;
            let (cleaned, report) = clean(&input, &config, strict)?;
            let summary = DatasetSummary::from_records(&cleaned.records);

            print_pretty(&report);
            print_json(&report)?;
            print_json(&summary)?;
        }
        Commands::ShowConfig { config } => {
            let config = CleaningConfig::load_or_default(config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Loads `input` and runs the cleaning pipeline over it.
#[tracing::instrument(skip(config), fields(input = %input, strict))]
fn clean(input: &str, config: &CleaningConfig, strict: bool) -> Result<(CleanedDataset, CleaningReport)> {
    let loaded = load_path(Path::new(input), strict)
        .with_context(|| format!("failed to load '{input}'"))?;
    info!(
        rows_read = loaded.report.rows_read,
        rows_unparseable = loaded.report.rows_unparseable,
        "Input loaded"
    );

    let cleaned = run(&loaded.records, config);
    let report = CleaningReport::new(&loaded.report, loaded.records.len(), &cleaned).with_input(input);

    Ok((cleaned, report))
}
