use serde::Serialize;

use crate::flag::FlagCounts;
use crate::record::TripRecord;

/// Min, max and mean of one numeric column, ignoring undefined values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: &'static str,
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl ColumnSummary {
    pub fn from_values(column: &'static str, values: impl IntoIterator<Item = Option<f64>>) -> Self {
        let mut s = ColumnSummary {
            column,
            count: 0,
            min: None,
            max: None,
            mean: None,
        };
        let mut sum = 0.0;

        for v in values.into_iter().flatten() {
            s.count += 1;
            sum += v;
            s.min = Some(s.min.map_or(v, |m| m.min(v)));
            s.max = Some(s.max.map_or(v, |m| m.max(v)));
        }

        if s.count > 0 {
            s.mean = Some(sum / s.count as f64);
        }
        s
    }
}

/// Aggregate statistics over a cleaned dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub row_count: usize,
    pub columns: Vec<ColumnSummary>,
    pub flags: FlagCounts,
}

impl DatasetSummary {
    pub fn from_records(records: &[TripRecord]) -> Self {
        macro_rules! column {
            ($name:literal, |$r:ident| $value:expr) => {
                ColumnSummary::from_values($name, records.iter().map(|$r| $value))
            };
        }

        DatasetSummary {
            row_count: records.len(),
            columns: vec![
                column!("trip_distance", |r| Some(r.trip_distance)),
                column!("fare_amount", |r| Some(r.fare_amount)),
                column!("total_amount", |r| Some(r.total_amount)),
                column!("trip_duration_minutes", |r| r
                    .trip_duration_minutes
                    .map(|m| m as f64)),
                column!("average_speed_mph", |r| r.average_speed_mph),
                column!("tip_percentage", |r| r.tip_percentage),
            ],
            flags: FlagCounts::from_records(records),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.column == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::trip;

    #[test]
    fn test_empty_column_has_no_stats() {
        let s = ColumnSummary::from_values("x", vec![None, None]);
        assert_eq!(s.count, 0);
        assert_eq!(s.min, None);
        assert_eq!(s.mean, None);
    }

    #[test]
    fn test_undefined_values_ignored() {
        let s = ColumnSummary::from_values("x", vec![Some(2.0), None, Some(6.0), Some(4.0)]);
        assert_eq!(s.count, 3);
        assert_eq!(s.min, Some(2.0));
        assert_eq!(s.max, Some(6.0));
        assert_eq!(s.mean, Some(4.0));
    }

    #[test]
    fn test_from_records_empty() {
        let summary = DatasetSummary::from_records(&[]);
        assert_eq!(summary.row_count, 0);
        assert_eq!(summary.columns.len(), 6);
        assert!(summary.columns.iter().all(|c| c.mean.is_none()));
    }

    #[test]
    fn test_from_records() {
        let mut a = trip();
        a.trip_duration_minutes = Some(10);
        a.average_speed_mph = Some(12.0);
        let mut b = trip();
        b.trip_distance = 1.25;
        b.trip_duration_minutes = Some(0);
        b.is_high_toll_outlier = true;

        let summary = DatasetSummary::from_records(&[a, b]);
        assert_eq!(summary.row_count, 2);

        let distance = summary.column("trip_distance").unwrap();
        assert_eq!(distance.min, Some(1.25));
        assert_eq!(distance.max, Some(3.75));
        assert_eq!(distance.mean, Some(2.5));

        let duration = summary.column("trip_duration_minutes").unwrap();
        assert_eq!(duration.mean, Some(5.0));

        let speed = summary.column("average_speed_mph").unwrap();
        assert_eq!(speed.count, 1);
        assert_eq!(speed.max, Some(12.0));

        assert_eq!(summary.flags.high_toll_outlier, 1);
    }
}
