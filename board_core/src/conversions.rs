//! From conversions between `board_config` (TOML schema) and the runtime
//! types in this crate.

use std::time::Duration;

use crate::config::SamplingCfg;
use crate::sample::WeightUnit;

impl From<&board_config::Sampling> for SamplingCfg {
    fn from(s: &board_config::Sampling) -> Self {
        Self {
            interval: Duration::from_millis(s.interval_ms),
            low_battery_threshold_kg: s.low_battery_threshold_kg,
        }
    }
}

impl From<board_config::Unit> for WeightUnit {
    fn from(u: board_config::Unit) -> Self {
        match u {
            board_config::Unit::Kg => WeightUnit::Kg,
            board_config::Unit::Lbs => WeightUnit::Lbs,
        }
    }
}
