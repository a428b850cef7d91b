//! Cleaning thresholds.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Thresholds used by the deletion and flagging rules.
///
/// Stored as a JSON object on disk; omitted keys keep their defaults:
/// ```json
/// {
///   "valid_vendor_ids": [1, 2],
///   "max_trip_duration_minutes": 360
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub valid_vendor_ids: Vec<u32>,
    pub max_trip_duration_minutes: i64,
    pub max_average_speed_mph: f64,
    pub total_amount_tolerance: f64,
    pub high_tip_percentage: f64,
    pub high_toll_amount: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            valid_vendor_ids: vec![1, 2],
            max_trip_duration_minutes: 360,
            max_average_speed_mph: 45.0,
            total_amount_tolerance: 0.01,
            high_tip_percentage: 100.0,
            high_toll_amount: 50.0,
        }
    }
}

impl CleaningConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{path}'"))?;
        serde_json::from_str(&content).with_context(|| format!("invalid config file '{path}'"))
    }

    /// Loads from `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn is_valid_vendor(&self, vendor_id: u32) -> bool {
        self.valid_vendor_ids.contains(&vendor_id)
    }
}
