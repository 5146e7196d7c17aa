//! Samples emitted by the sampling loop.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::mac::DeviceId;

/// Pounds per kilogram, as used by the board's display path.
pub const KG_TO_LBS: f64 = 2.20462;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Validity {
    Valid,
    /// The board had no valid balance data, or the reading could not be decoded.
    Invalid,
    /// The total fell to the low-battery threshold; the session ends.
    LowBattery,
}

/// Classify a decoded total. The threshold itself counts as low battery.
#[inline]
pub fn classify(total_kg: f64, low_battery_threshold_kg: f64) -> Validity {
    if total_kg <= low_battery_threshold_kg {
        Validity::LowBattery
    } else {
        Validity::Valid
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    /// Position in this session's stream, starting at 0.
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub device_id: DeviceId,
    /// `None` for `Invalid` samples.
    pub total_weight_kg: Option<f64>,
    pub validity: Validity,
}

impl Sample {
    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }

    /// Persisted record: timestamp and weight, tab separated.
    pub fn record_line(&self) -> Option<String> {
        let kg = self.total_weight_kg?;
        Some(format!(
            "{}\t{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            kg
        ))
    }

    pub fn weight_in(&self, unit: WeightUnit) -> Option<f64> {
        self.total_weight_kg.map(|kg| unit.from_kg(kg))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
}

impl WeightUnit {
    pub fn from_kg(self, kg: f64) -> f64 {
        match self {
            WeightUnit::Kg => kg,
            WeightUnit::Lbs => kg * KG_TO_LBS,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lbs => "lbs",
        }
    }
}

/// Wall-clock milliseconds → UTC timestamp, clamping unrepresentable values
/// to the epoch.
pub fn timestamp_from_unix_ms(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}
