//! Anomaly flags.
//!
//! Flags mark records that are valid but statistically unusual. They never
//! remove a row; downstream analysis decides whether to exclude or weight
//! flagged trips.

use serde::Serialize;
use tracing::debug;

use crate::config::CleaningConfig;
use crate::record::TripRecord;

/// Precision the total/component gap is rounded to before comparison.
const GAP_PRECISION: f64 = 1e9;

/// `total_amount` differs from its component sum by more than the tolerance.
///
/// The gap is rounded to nine decimal places so summation noise cannot push
/// a gap equal to the tolerance over it.
pub fn is_total_amount_discrepant(record: &TripRecord, config: &CleaningConfig) -> bool {
    let gap = (record.total_amount - record.component_sum()).abs();
    let gap = (gap * GAP_PRECISION).round() / GAP_PRECISION;
    gap > config.total_amount_tolerance
}

/// Tip percentage is defined and strictly above the threshold.
pub fn is_high_tip_outlier(record: &TripRecord, config: &CleaningConfig) -> bool {
    record
        .tip_percentage
        .is_some_and(|pct| pct > config.high_tip_percentage)
}

/// Tolls strictly above the threshold.
pub fn is_high_toll_outlier(record: &TripRecord, config: &CleaningConfig) -> bool {
    record.tolls_amount > config.high_toll_amount
}

/// Number of records carrying each flag.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FlagCounts {
    pub total_amount_discrepant: usize,
    pub high_tip_outlier: usize,
    pub high_toll_outlier: usize,
}

impl FlagCounts {
    pub fn from_records(records: &[TripRecord]) -> Self {
        let mut c = FlagCounts::default();
        for r in records {
            if r.is_total_amount_discrepant {
                c.total_amount_discrepant += 1;
            }
            if r.is_high_tip_outlier {
                c.high_tip_outlier += 1;
            }
            if r.is_high_toll_outlier {
                c.high_toll_outlier += 1;
            }
        }
        c
    }
}

/// Sets all three flags on every record. Expects `tip_percentage` to be
/// derived already.
pub fn flag_anomalies(records: &mut [TripRecord], config: &CleaningConfig) -> FlagCounts {
    for r in records.iter_mut() {
        r.is_total_amount_discrepant = is_total_amount_discrepant(r, config);
        r.is_high_tip_outlier = is_high_tip_outlier(r, config);
        r.is_high_toll_outlier = is_high_toll_outlier(r, config);
    }

    let counts = FlagCounts::from_records(records);
    debug!(
        total_amount_discrepant = counts.total_amount_discrepant,
        high_tip_outlier = counts.high_tip_outlier,
        high_toll_outlier = counts.high_toll_outlier,
        "Anomaly flags set"
    );
    counts
}
