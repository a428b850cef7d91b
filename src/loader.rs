//! Delimited-text loader for raw trip exports.
//!
//! Columns are deserialized by position in the order of [`RAW_COLUMNS`]. Trailing
//! columns beyond the first 19 are ignored, which lets a previously cleaned
//! file be loaded again.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::record::{RAW_COLUMNS, StoreAndForwardFlag, TIMESTAMP_FORMAT, TripRecord};

/// Row counts observed while loading.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_unparseable: usize,
}

/// Parsed records together with their [`LoadReport`].
#[derive(Debug, Default)]
pub struct LoadedDataset {
    pub records: Vec<TripRecord>,
    pub report: LoadReport,
}

/// Loads a CSV file from disk.
///
/// In strict mode the first unparseable row aborts the load; otherwise such
/// rows are skipped and counted.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load_path(path: &Path, strict: bool) -> Result<LoadedDataset, LoadError> {
    let file = File::open(path)?;
    load_reader(file, strict)
}

/// Loads CSV text with a header line from any reader.
pub fn load_reader<R: Read>(reader: R, strict: bool) -> Result<LoadedDataset, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut dataset = LoadedDataset::default();

    for result in rdr.records() {
        let row = result?;
        dataset.report.rows_read += 1;

        match parse_record(&row) {
            Ok(record) => dataset.records.push(record),
            Err(e) if strict => return Err(e),
            Err(e) => {
                warn!(error = %e, "Skipping unparseable row");
                dataset.report.rows_unparseable += 1;
            }
        }
    }

    debug!(
        rows_read = dataset.report.rows_read,
        rows_unparseable = dataset.report.rows_unparseable,
        "Load complete"
    );
    Ok(dataset)
}

/// One input row as typed by serde, before timestamps and the
/// store-and-forward code are checked.
///
/// Deserialized by position, so field order must match [`RAW_COLUMNS`].
/// Empty nullable fields come through as `None`.
#[derive(Debug, Deserialize)]
struct RawTripRow {
    vendor_id: u32,
    pickup_time: String,
    dropoff_time: String,
    passenger_count: Option<u32>,
    trip_distance: f64,
    rate_code: Option<u32>,
    store_and_forward_flag: Option<String>,
    pickup_location_id: u32,
    dropoff_location_id: u32,
    payment_type: u8,
    fare_amount: f64,
    extra: f64,
    mta_tax: f64,
    tip_amount: f64,
    tolls_amount: f64,
    improvement_surcharge: f64,
    total_amount: f64,
    congestion_surcharge: Option<f64>,
    airport_fee: Option<f64>,
}

/// Parses one raw row into a [`TripRecord`] with all derived fields unset.
pub fn parse_record(row: &StringRecord) -> Result<TripRecord, LoadError> {
    let line = row.position().map(|p| p.line()).unwrap_or(0);
    if row.len() < RAW_COLUMNS.len() {
        return Err(LoadError::MissingColumns {
            line,
            found: row.len(),
        });
    }

    let row: StringRecord = row.iter().take(RAW_COLUMNS.len()).collect();
    let invalid = |idx: usize, reason: String| LoadError::InvalidField {
        line,
        column: RAW_COLUMNS[idx],
        value: row.get(idx).unwrap_or("").to_string(),
        reason,
    };

    let raw: RawTripRow = row.deserialize(None).map_err(|e| {
        let field = match e.kind() {
            csv::ErrorKind::Deserialize { err, .. } => err
                .field()
                .map(|idx| (idx as usize, err.kind().to_string())),
            _ => None,
        };
        match field {
            Some((idx, reason)) if idx < RAW_COLUMNS.len() => invalid(idx, reason),
            _ => LoadError::Csv(e),
        }
    })?;

    let decimals = [
        (4, Some(raw.trip_distance)),
        (10, Some(raw.fare_amount)),
        (11, Some(raw.extra)),
        (12, Some(raw.mta_tax)),
        (13, Some(raw.tip_amount)),
        (14, Some(raw.tolls_amount)),
        (15, Some(raw.improvement_surcharge)),
        (16, Some(raw.total_amount)),
        (17, raw.congestion_surcharge),
        (18, raw.airport_fee),
    ];
    if let Some((idx, _)) = decimals
        .iter()
        .find(|(_, v)| v.is_some_and(|v| !v.is_finite()))
    {
        return Err(invalid(*idx, "not a finite number".to_string()));
    }

    let timestamp = |idx: usize, text: &str| {
        NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
            .map_err(|e| invalid(idx, e.to_string()))
    };
    let pickup_time = timestamp(1, &raw.pickup_time)?;
    let dropoff_time = timestamp(2, &raw.dropoff_time)?;

    let store_and_forward_flag = match raw.store_and_forward_flag.as_deref() {
        None | Some("") => None,
        Some(code) => Some(
            StoreAndForwardFlag::from_code(code)
                .ok_or_else(|| invalid(6, "expected Y or N".to_string()))?,
        ),
    };

    Ok(TripRecord {
        vendor_id: raw.vendor_id,
        pickup_time,
        dropoff_time,
        passenger_count: raw.passenger_count,
        trip_distance: raw.trip_distance,
        rate_code: raw.rate_code,
        store_and_forward_flag,
        pickup_location_id: raw.pickup_location_id,
        dropoff_location_id: raw.dropoff_location_id,
        payment_type: raw.payment_type,
        fare_amount: raw.fare_amount,
        extra: raw.extra,
        mta_tax: raw.mta_tax,
        tip_amount: raw.tip_amount,
        tolls_amount: raw.tolls_amount,
        improvement_surcharge: raw.improvement_surcharge,
        total_amount: raw.total_amount,
        congestion_surcharge: raw.congestion_surcharge,
        airport_fee: raw.airport_fee,
        trip_duration_minutes: None,
        average_speed_mph: None,
        is_total_amount_discrepant: false,
        tip_percentage: None,
        is_high_tip_outlier: false,
        is_high_toll_outlier: false,
    })
}
