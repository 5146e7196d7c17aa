//! Builder for `Session`.
//!
//! Validation happens once in `build()`; setters only record values.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use board_traits::BoardDriver;
use board_traits::clock::{Clock, MonotonicClock};

use crate::calibration::CalibrationStore;
use crate::config::{DEFAULT_SCAN_TIMEOUT_S, SamplingCfg};
use crate::error::{BuildError, Result};
use crate::mac::DeviceId;
use crate::session::Session;
use crate::state::StateCell;

/// Longest accepted sampling interval.
const MAX_INTERVAL: Duration = Duration::from_secs(3600);

pub struct SessionBuilder<D> {
    driver: Option<D>,
    sampling: Option<SamplingCfg>,
    scan_timeout_s: Option<u32>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
}

impl<D> Default for SessionBuilder<D> {
    fn default() -> Self {
        Self {
            driver: None,
            sampling: None,
            scan_timeout_s: None,
            clock: None,
        }
    }
}

impl<D: BoardDriver + Send + 'static> SessionBuilder<D> {
    pub fn with_driver(mut self, driver: D) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingCfg) -> Self {
        self.sampling = Some(sampling);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        let mut s = self.sampling.unwrap_or_default();
        s.interval = interval;
        self.sampling = Some(s);
        self
    }

    pub fn with_scan_timeout_s(mut self, secs: u32) -> Self {
        self.scan_timeout_s = Some(secs);
        self
    }

    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Session<D>> {
        let driver = self
            .driver
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDriver))?;
        let sampling = self.sampling.unwrap_or_default();
        if sampling.interval.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "sampling interval must be > 0",
            )));
        }
        if sampling.interval > MAX_INTERVAL {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "sampling interval must be <= 1h",
            )));
        }
        if !sampling.low_battery_threshold_kg.is_finite() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "low battery threshold must be finite",
            )));
        }
        let scan_timeout_s = self.scan_timeout_s.unwrap_or(DEFAULT_SCAN_TIMEOUT_S);
        if scan_timeout_s == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "scan timeout must be >= 1s",
            )));
        }
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));

        Ok(Session {
            driver: Arc::new(Mutex::new(driver)),
            sampling,
            scan_timeout_s,
            clock,
            state: StateCell::default(),
            calibration: Arc::new(CalibrationStore::new()),
            device_id: DeviceId::NONE,
            worker: None,
        })
    }
}
