//! Hard-deletion rules.
//!
//! A rule matches a record that is unusable: logically impossible, or from a
//! source that cannot be trusted. Matching records are removed outright and
//! never corrected. Records that are merely unusual are left to
//! [`crate::flag`].

use serde::Serialize;

use crate::config::CleaningConfig;
use crate::derive::duration_minutes;
use crate::record::TripRecord;

/// Every deletion rule, in the order the pipeline applies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeletionRule {
    /// `vendor_id` outside the configured set.
    UnknownVendor,
    /// `passenger_count` recorded as exactly zero. Missing is kept.
    ZeroPassengers,
    /// Any of the nine monetary fields below zero.
    NegativeAmount,
    /// Dropoff at or before pickup.
    NonIncreasingTimestamps,
    /// Trip longer than the configured maximum.
    ExcessiveDuration,
    /// Average speed above the configured maximum. Undefined speed passes.
    ExcessiveSpeed,
}

impl DeletionRule {
    pub const ALL: [DeletionRule; 6] = [
        DeletionRule::UnknownVendor,
        DeletionRule::ZeroPassengers,
        DeletionRule::NegativeAmount,
        DeletionRule::NonIncreasingTimestamps,
        DeletionRule::ExcessiveDuration,
        DeletionRule::ExcessiveSpeed,
    ];

    /// Rules that only look at raw columns.
    pub const RAW: [DeletionRule; 4] = [
        DeletionRule::UnknownVendor,
        DeletionRule::ZeroPassengers,
        DeletionRule::NegativeAmount,
        DeletionRule::NonIncreasingTimestamps,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DeletionRule::UnknownVendor => "unknown_vendor",
            DeletionRule::ZeroPassengers => "zero_passengers",
            DeletionRule::NegativeAmount => "negative_amount",
            DeletionRule::NonIncreasingTimestamps => "non_increasing_timestamps",
            DeletionRule::ExcessiveDuration => "excessive_duration",
            DeletionRule::ExcessiveSpeed => "excessive_speed",
        }
    }

    /// Returns `true` if `record` must be deleted under this rule.
    pub fn rejects(self, record: &TripRecord, config: &CleaningConfig) -> bool {
        match self {
            DeletionRule::UnknownVendor => !config.is_valid_vendor(record.vendor_id),
            DeletionRule::ZeroPassengers => record.passenger_count == Some(0),
            DeletionRule::NegativeAmount => record.monetary_amounts().any(|a| a < 0.0),
            DeletionRule::NonIncreasingTimestamps => record.dropoff_time <= record.pickup_time,
            DeletionRule::ExcessiveDuration => {
                let minutes = record
                    .trip_duration_minutes
                    .unwrap_or_else(|| duration_minutes(record));
                minutes > config.max_trip_duration_minutes
            }
            DeletionRule::ExcessiveSpeed => record
                .average_speed_mph
                .is_some_and(|mph| mph > config.max_average_speed_mph),
        }
    }
}

/// Returns the first rule in [`DeletionRule::ALL`] order that rejects `record`.
pub fn first_violation(record: &TripRecord, config: &CleaningConfig) -> Option<DeletionRule> {
    DeletionRule::ALL
        .into_iter()
        .find(|rule| rule.rejects(record, config))
}

/// Removes every record matching `rule` and returns how many were removed.
pub fn delete_where(
    records: &mut Vec<TripRecord>,
    rule: DeletionRule,
    config: &CleaningConfig,
) -> usize {
    let before = records.len();
    records.retain(|r| !rule.rejects(r, config));
    before - records.len()
}

/// Number of rows removed by each rule.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalCounts {
    pub unknown_vendor: usize,
    pub zero_passengers: usize,
    pub negative_amount: usize,
    pub non_increasing_timestamps: usize,
    pub excessive_duration: usize,
    pub excessive_speed: usize,
}

impl RemovalCounts {
    pub fn record(&mut self, rule: DeletionRule, removed: usize) {
        *self.slot(rule) += removed;
    }

    pub fn get(&self, rule: DeletionRule) -> usize {
        match rule {
            DeletionRule::UnknownVendor => self.unknown_vendor,
            DeletionRule::ZeroPassengers => self.zero_passengers,
            DeletionRule::NegativeAmount => self.negative_amount,
            DeletionRule::NonIncreasingTimestamps => self.non_increasing_timestamps,
            DeletionRule::ExcessiveDuration => self.excessive_duration,
            DeletionRule::ExcessiveSpeed => self.excessive_speed,
        }
    }

    pub fn total(&self) -> usize {
        DeletionRule::ALL.into_iter().map(|r| self.get(r)).sum()
    }

    fn slot(&mut self, rule: DeletionRule) -> &mut usize {
        match rule {
            DeletionRule::UnknownVendor => &mut self.unknown_vendor,
            DeletionRule::ZeroPassengers => &mut self.zero_passengers,
            DeletionRule::NegativeAmount => &mut self.negative_amount,
            DeletionRule::NonIncreasingTimestamps => &mut self.non_increasing_timestamps,
            DeletionRule::ExcessiveDuration => &mut self.excessive_duration,
            DeletionRule::ExcessiveSpeed => &mut self.excessive_speed,
        }
    }
}
