//! Derived trip features.
//!
//! Every ratio guards its denominator: when it is zero or negative the
//! derived field stays `None`. It is never forced to zero.

use tracing::debug;

use crate::record::TripRecord;

/// Whole minutes between pickup and dropoff, truncated toward zero.
///
/// A trip of 360 minutes 59 seconds counts as 360 minutes.
pub fn duration_minutes(record: &TripRecord) -> i64 {
    (record.dropoff_time - record.pickup_time).num_minutes()
}

/// Miles per hour over `minutes`, or `None` when `minutes` is not positive.
pub fn average_speed_mph(distance_miles: f64, minutes: i64) -> Option<f64> {
    if minutes <= 0 {
        return None;
    }
    Some(distance_miles / minutes as f64 * 60.0)
}

/// Tip as a percentage of fare, or `None` when the fare is not positive.
pub fn tip_percentage(tip_amount: f64, fare_amount: f64) -> Option<f64> {
    if fare_amount <= 0.0 {
        return None;
    }
    Some(tip_amount / fare_amount * 100.0)
}

/// Fills `trip_duration_minutes` on every record.
pub fn derive_durations(records: &mut [TripRecord]) {
    for r in records.iter_mut() {
        r.trip_duration_minutes = Some(duration_minutes(r));
    }
}

/// Fills `average_speed_mph`. Requires durations to be derived first.
pub fn derive_speeds(records: &mut [TripRecord]) {
    let mut undefined = 0usize;
    for r in records.iter_mut() {
        r.average_speed_mph = r
            .trip_duration_minutes
            .and_then(|m| average_speed_mph(r.trip_distance, m));
        if r.average_speed_mph.is_none() {
            undefined += 1;
        }
    }
    debug!(undefined, "Average speeds derived");
}

/// Fills `tip_percentage` on every record.
pub fn derive_tip_percentages(records: &mut [TripRecord]) {
    let mut undefined = 0usize;
    for r in records.iter_mut() {
        r.tip_percentage = tip_percentage(r.tip_amount, r.fare_amount);
        if r.tip_percentage.is_none() {
            undefined += 1;
        }
    }
    debug!(undefined, "Tip percentages derived");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::{at, trip};

    #[test]
    fn test_fifteen_minute_trip() {
        let mut rows = vec![trip()];
        derive_durations(&mut rows);
        derive_speeds(&mut rows);

        assert_eq!(rows[0].trip_duration_minutes, Some(15));
        assert_eq!(rows[0].average_speed_mph, Some(15.0));
    }

    #[test]
    fn test_duration_truncates_partial_minutes() {
        let mut t = trip();
        t.dropoff_time = at(8, 15, 59);
        assert_eq!(duration_minutes(&t), 15);

        t.dropoff_time = at(8, 0, 30);
        assert_eq!(duration_minutes(&t), 0);
    }

    #[test]
    fn test_duration_negative_before_validation() {
        let mut t = trip();
        t.dropoff_time = at(7, 30, 0);
        assert_eq!(duration_minutes(&t), -30);
    }

    #[test]
    fn test_speed_undefined_for_sub_minute_trip() {
        let mut t = trip();
        t.dropoff_time = at(8, 0, 40);
        let mut rows = vec![t];
        derive_durations(&mut rows);
        derive_speeds(&mut rows);

        assert_eq!(rows[0].trip_duration_minutes, Some(0));
        assert_eq!(rows[0].average_speed_mph, None);
    }

    #[test]
    fn test_speed_undefined_without_duration() {
        let mut rows = vec![trip()];
        derive_speeds(&mut rows);
        assert_eq!(rows[0].average_speed_mph, None);
    }

    #[test]
    fn test_zero_distance_speed_is_zero() {
        assert_eq!(average_speed_mph(0.0, 10), Some(0.0));
    }

    #[test]
    fn test_tip_percentage() {
        assert_eq!(tip_percentage(15.0, 10.0), Some(150.0));
        assert_eq!(tip_percentage(5.0, 10.0), Some(50.0));
        assert_eq!(tip_percentage(5.0, 0.0), None);
    }

    #[test]
    fn test_derive_tip_percentages_zero_fare() {
        let mut t = trip();
        t.fare_amount = 0.0;
        let mut rows = vec![t, trip()];
        derive_tip_percentages(&mut rows);

        assert_eq!(rows[0].tip_percentage, None);
        assert_eq!(rows[1].tip_percentage, Some(20.0));
    }
}
