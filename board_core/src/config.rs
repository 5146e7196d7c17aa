//! Runtime configuration for the session engine.
//!
//! Separate from the TOML schema in `board_config`; see `conversions` for
//! the mapping.

use std::time::Duration;

/// Sampling loop parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingCfg {
    /// Time between the starts of two ticks.
    pub interval: Duration,
    /// Totals at or below this are treated as a failing battery.
    pub low_battery_threshold_kg: f64,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            low_battery_threshold_kg: -50.0,
        }
    }
}

/// Default Bluetooth scan window, seconds.
pub const DEFAULT_SCAN_TIMEOUT_S: u32 = 3;
