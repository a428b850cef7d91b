//! The trip record and its column layout.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

/// Textual timestamp format used by the raw trip exports.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// `payment_type` value for Flex Fare (non-metered) trips.
pub const FLEX_FARE_PAYMENT_TYPE: u8 = 0;

/// Raw column headers, in input order.
pub const RAW_COLUMNS: [&str; 19] = [
    "VendorID",
    "tpep_pickup_datetime",
    "tpep_dropoff_datetime",
    "passenger_count",
    "trip_distance",
    "RatecodeID",
    "store_and_fwd_flag",
    "PULocationID",
    "DOLocationID",
    "payment_type",
    "fare_amount",
    "extra",
    "mta_tax",
    "tip_amount",
    "tolls_amount",
    "improvement_surcharge",
    "total_amount",
    "congestion_surcharge",
    "airport_fee",
];

/// Whether the trip was held in vehicle memory before being sent to the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StoreAndForwardFlag {
    #[serde(rename = "Y")]
    Stored,
    #[serde(rename = "N")]
    NotStored,
}

impl StoreAndForwardFlag {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "Y" => Some(Self::Stored),
            "N" => Some(Self::NotStored),
            _ => None,
        }
    }
}

/// One trip as reported by a vendor, plus the columns the pipeline derives.
///
/// Field order matches the cleaned CSV layout: the 19 raw columns under
/// their input names, then the derived columns. Derived fields stay `None`
/// (or `false` for flags) until the pipeline fills them in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripRecord {
    #[serde(rename = "VendorID")]
    pub vendor_id: u32,
    #[serde(rename = "tpep_pickup_datetime", serialize_with = "serialize_timestamp")]
    pub pickup_time: NaiveDateTime,
    #[serde(rename = "tpep_dropoff_datetime", serialize_with = "serialize_timestamp")]
    pub dropoff_time: NaiveDateTime,
    pub passenger_count: Option<u32>,
    pub trip_distance: f64,
    #[serde(rename = "RatecodeID")]
    pub rate_code: Option<u32>,
    #[serde(rename = "store_and_fwd_flag")]
    pub store_and_forward_flag: Option<StoreAndForwardFlag>,
    #[serde(rename = "PULocationID")]
    pub pickup_location_id: u32,
    #[serde(rename = "DOLocationID")]
    pub dropoff_location_id: u32,
    pub payment_type: u8,
    pub fare_amount: f64,
    pub extra: f64,
    pub mta_tax: f64,
    pub tip_amount: f64,
    pub tolls_amount: f64,
    pub improvement_surcharge: f64,
    pub total_amount: f64,
    pub congestion_surcharge: Option<f64>,
    pub airport_fee: Option<f64>,

    // derived
    pub trip_duration_minutes: Option<i64>,
    pub average_speed_mph: Option<f64>,
    pub is_total_amount_discrepant: bool,
    pub tip_percentage: Option<f64>,
    pub is_high_tip_outlier: bool,
    pub is_high_toll_outlier: bool,
}

impl TripRecord {
    /// Flex Fare trips legitimately omit passenger count and rate code.
    pub fn is_flex_fare(&self) -> bool {
        self.payment_type == FLEX_FARE_PAYMENT_TYPE
    }

    /// All nine monetary fields; missing optional surcharges are skipped.
    pub fn monetary_amounts(&self) -> impl Iterator<Item = f64> {
        [
            Some(self.fare_amount),
            Some(self.extra),
            Some(self.mta_tax),
            Some(self.tip_amount),
            Some(self.tolls_amount),
            Some(self.improvement_surcharge),
            Some(self.total_amount),
            self.congestion_surcharge,
            self.airport_fee,
        ]
        .into_iter()
        .flatten()
    }

    /// Sum of the components `total_amount` is expected to equal.
    ///
    /// Congestion surcharge and airport fee are left out: the vendors' own
    /// totals do not include them consistently.
    pub fn component_sum(&self) -> f64 {
        self.fare_amount
            + self.extra
            + self.mta_tax
            + self.tip_amount
            + self.tolls_amount
            + self.improvement_surcharge
    }

    /// Clears every derived column back to its initial state.
    pub fn reset_derived(&mut self) {
        self.trip_duration_minutes = None;
        self.average_speed_mph = None;
        self.is_total_amount_discrepant = false;
        self.tip_percentage = None;
        self.is_high_tip_outlier = false;
        self.is_high_toll_outlier = false;
    }
}

fn serialize_timestamp<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::NaiveDate;

    pub fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 12, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    /// A valid 15-minute, 3.75-mile metered trip whose total matches its components.
    pub fn trip() -> TripRecord {
        TripRecord {
            vendor_id: 2,
            pickup_time: at(8, 0, 0),
            dropoff_time: at(8, 15, 0),
            passenger_count: Some(1),
            trip_distance: 3.75,
            rate_code: Some(1),
            store_and_forward_flag: Some(StoreAndForwardFlag::NotStored),
            pickup_location_id: 161,
            dropoff_location_id: 237,
            payment_type: 1,
            fare_amount: 10.0,
            extra: 1.0,
            mta_tax: 0.5,
            tip_amount: 2.0,
            tolls_amount: 0.0,
            improvement_surcharge: 1.0,
            total_amount: 14.5,
            congestion_surcharge: Some(2.5),
            airport_fee: Some(0.0),
            trip_duration_minutes: None,
            average_speed_mph: None,
            is_total_amount_discrepant: false,
            tip_percentage: None,
            is_high_tip_outlier: false,
            is_high_toll_outlier: false,
        }
    }
}
