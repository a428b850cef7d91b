//! Output formatting and persistence for cleaned trips and run reports.
//!
//! Supports pretty-printing, JSON serialization, and CSV write/append.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

use crate::pipeline::CleaningReport;
use crate::record::TripRecord;
use csv::WriterBuilder;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl Debug) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes `value` as pretty-printed JSON to `path`, replacing any existing file.
pub fn write_json(path: &str, value: &impl Serialize) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create '{path}'"))?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

/// Writes the cleaned dataset as CSV: raw columns first, derived columns last.
///
/// Replaces any existing file at `path`.
pub fn write_dataset(path: &str, records: &[TripRecord]) -> Result<()> {
    debug!(path, rows = records.len(), "Writing cleaned dataset");
    let file = File::create(path).with_context(|| format!("failed to create '{path}'"))?;

    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Appends a [`CleaningReport`] as a row to an audit CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_report(path: &str, report: &CleaningReport) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending audit record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // header only on a fresh file
        .from_writer(file);

    writer.serialize(report)?;
    writer.flush()?;

    Ok(())
}
