//! Fixed-order cleaning pipeline.
//!
//! Validate → derive duration → delete long trips → derive speed → delete
//! fast trips → derive tip percentage → flag. The loaded dataset is only
//! read; all work happens on a copy.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::CleaningConfig;
use crate::derive::{derive_durations, derive_speeds, derive_tip_percentages};
use crate::flag::{FlagCounts, flag_anomalies};
use crate::loader::LoadReport;
use crate::record::TripRecord;
use crate::validate::{DeletionRule, RemovalCounts, delete_where};

/// Pipeline result: surviving records plus what happened to the rest.
#[derive(Debug, Clone)]
pub struct CleanedDataset {
    pub records: Vec<TripRecord>,
    pub removals: RemovalCounts,
    pub flags: FlagCounts,
}

/// Runs every stage over a copy of `loaded`.
#[tracing::instrument(skip_all, fields(rows = loaded.len()))]
pub fn run(loaded: &[TripRecord], config: &CleaningConfig) -> CleanedDataset {
    let mut working = loaded.to_vec();
    for r in working.iter_mut() {
        r.reset_derived();
    }

    let mut removals = RemovalCounts::default();
    let mut apply = |records: &mut Vec<TripRecord>, rule: DeletionRule| {
        let removed = delete_where(records, rule, config);
        info!(rule = rule.name(), removed, remaining = records.len(), "Deletion rule applied");
        removals.record(rule, removed);
    };

    for rule in DeletionRule::RAW {
        apply(&mut working, rule);
    }

    derive_durations(&mut working);
    apply(&mut working, DeletionRule::ExcessiveDuration);

    derive_speeds(&mut working);
    apply(&mut working, DeletionRule::ExcessiveSpeed);

    derive_tip_percentages(&mut working);
    let flags = flag_anomalies(&mut working, config);

    info!(
        retained = working.len(),
        removed = removals.total(),
        "Pipeline complete"
    );

    CleanedDataset {
        records: working,
        removals,
        flags,
    }
}

/// One audit row describing a pipeline run.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CleaningReport {
    pub timestamp: DateTime<Utc>,
    pub input: Option<String>,
    pub rows_read: usize,
    pub rows_unparseable: usize,
    pub rows_loaded: usize,

    // removals
    pub removed_unknown_vendor: usize,
    pub removed_zero_passengers: usize,
    pub removed_negative_amount: usize,
    pub removed_non_increasing_timestamps: usize,
    pub removed_excessive_duration: usize,
    pub removed_excessive_speed: usize,

    pub rows_retained: usize,

    // flags
    pub flagged_total_amount_discrepant: usize,
    pub flagged_high_tip_outlier: usize,
    pub flagged_high_toll_outlier: usize,
}

impl CleaningReport {
    pub fn new(load: &LoadReport, loaded: usize, cleaned: &CleanedDataset) -> Self {
        let r = &cleaned.removals;
        CleaningReport {
            timestamp: Utc::now(),
            input: None,
            rows_read: load.rows_read,
            rows_unparseable: load.rows_unparseable,
            rows_loaded: loaded,
            removed_unknown_vendor: r.unknown_vendor,
            removed_zero_passengers: r.zero_passengers,
            removed_negative_amount: r.negative_amount,
            removed_non_increasing_timestamps: r.non_increasing_timestamps,
            removed_excessive_duration: r.excessive_duration,
            removed_excessive_speed: r.excessive_speed,
            rows_retained: cleaned.records.len(),
            flagged_total_amount_discrepant: cleaned.flags.total_amount_discrepant,
            flagged_high_tip_outlier: cleaned.flags.high_tip_outlier,
            flagged_high_toll_outlier: cleaned.flags.high_toll_outlier,
        }
    }

    /// Set the input name (file path or object key)
    pub fn with_input(mut self, input: &str) -> Self {
        self.input = Some(input.to_string());
        self
    }

    pub fn rows_removed(&self) -> usize {
        self.rows_loaded.saturating_sub(self.rows_retained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::{at, trip};
    use crate::validate::first_violation;

    fn cfg() -> CleaningConfig {
        CleaningConfig::default()
    }

    fn mixed_rows() -> Vec<TripRecord> {
        let mut unknown_vendor = trip();
        unknown_vendor.vendor_id = 6;

        let mut zero_passengers = trip();
        zero_passengers.passenger_count = Some(0);

        let mut negative_fare = trip();
        negative_fare.fare_amount = -1.0;

        let mut inverted = trip();
        inverted.dropoff_time = at(7, 50, 0);

        let mut too_long = trip();
        too_long.pickup_time = at(0, 0, 0);
        too_long.dropoff_time = at(6, 1, 0);

        let mut too_fast = trip();
        too_fast.trip_distance = 20.0;

        let mut flex_fare = trip();
        flex_fare.payment_type = 0;
        flex_fare.passenger_count = None;
        flex_fare.rate_code = None;

        let mut zero_distance = trip();
        zero_distance.trip_distance = 0.0;

        let mut sub_minute = trip();
        sub_minute.dropoff_time = at(8, 0, 30);
        sub_minute.trip_distance = 5.0;

        let mut high_toll = trip();
        high_toll.tolls_amount = 50.01;
        high_toll.total_amount = 64.51;

        vec![
            trip(),
            unknown_vendor,
            zero_passengers,
            negative_fare,
            inverted,
            too_long,
            too_fast,
            flex_fare,
            zero_distance,
            sub_minute,
            high_toll,
        ]
    }

    #[test]
    fn test_fifteen_minute_trip_survives() {
        let out = run(&[trip()], &cfg());
        assert_eq!(out.records.len(), 1);
        let r = &out.records[0];
        assert_eq!(r.trip_duration_minutes, Some(15));
        assert_eq!(r.average_speed_mph, Some(15.0));
        assert_eq!(r.tip_percentage, Some(20.0));
        assert!(!r.is_total_amount_discrepant);
    }

    #[test]
    fn test_removals_attributed_per_rule() {
        let out = run(&mixed_rows(), &cfg());

        assert_eq!(
            out.removals,
            RemovalCounts {
                unknown_vendor: 1,
                zero_passengers: 1,
                negative_amount: 1,
                non_increasing_timestamps: 1,
                excessive_duration: 1,
                excessive_speed: 1,
            }
        );
        assert_eq!(out.records.len(), 5);
        assert_eq!(out.flags.high_toll_outlier, 1);
    }

    #[test]
    fn test_output_invariants_hold() {
        let config = cfg();
        let out = run(&mixed_rows(), &config);

        for r in &out.records {
            assert!(r.dropoff_time > r.pickup_time);
            assert!(r.trip_duration_minutes.unwrap() <= 360);
            assert!(r.average_speed_mph.is_none_or(|s| s <= 45.0));
            assert!(config.is_valid_vendor(r.vendor_id));
            assert_ne!(r.passenger_count, Some(0));
            assert!(r.monetary_amounts().all(|a| a >= 0.0));
            assert_eq!(first_violation(r, &config), None);
        }
    }

    #[test]
    fn test_undefined_speed_is_not_deleted() {
        let out = run(&mixed_rows(), &cfg());
        let sub_minute = out
            .records
            .iter()
            .find(|r| r.trip_duration_minutes == Some(0))
            .unwrap();
        assert_eq!(sub_minute.average_speed_mph, None);
    }

    #[test]
    fn test_flex_fare_trip_retained() {
        let out = run(&mixed_rows(), &cfg());
        assert!(out.records.iter().any(|r| r.is_flex_fare() && r.passenger_count.is_none()));
    }

    #[test]
    fn test_negative_fare_deleted_regardless() {
        let mut t = trip();
        t.fare_amount = -1.0;
        let out = run(&[t], &cfg());
        assert!(out.records.is_empty());
        assert_eq!(out.removals.negative_amount, 1);
    }

    #[test]
    fn test_loaded_dataset_untouched() {
        let loaded = mixed_rows();
        let snapshot = loaded.clone();
        let _ = run(&loaded, &cfg());
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let first = run(&mixed_rows(), &cfg());
        let second = run(&first.records, &cfg());

        assert_eq!(second.records, first.records);
        assert_eq!(second.removals.total(), 0);
        assert_eq!(second.flags, first.flags);
    }

    #[test]
    fn test_report_from_run() {
        let rows = mixed_rows();
        let out = run(&rows, &cfg());
        let load = LoadReport {
            rows_read: 12,
            rows_unparseable: 1,
        };
        let report = CleaningReport::new(&load, rows.len(), &out).with_input("trips.csv");

        assert_eq!(report.input.as_deref(), Some("trips.csv"));
        assert_eq!(report.rows_loaded, 11);
        assert_eq!(report.rows_retained, 5);
        assert_eq!(report.rows_removed(), 6);
        assert_eq!(report.removed_excessive_speed, 1);
        assert_eq!(report.flagged_high_toll_outlier, 1);
    }

    #[test]
    fn test_rows_removed_never_underflows() {
        let report = CleaningReport {
            rows_loaded: 2,
            rows_retained: 5,
            ..Default::default()
        };
        assert_eq!(report.rows_removed(), 0);
    }
}
