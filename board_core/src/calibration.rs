//! Per-corner calibration triples and the per-session store that holds them.

use std::sync::{Arc, PoisonError, RwLock};

use board_traits::{BoardDriver, CalPoint, Corner};

use crate::codes;
use crate::error::{BoardError, Result};

/// Raw sensor readings of one corner at the 0, 17 and 34 kg reference masses.
///
/// `low < mid < high` is expected; the decoder reports spans that violate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CornerCalibration {
    pub low: i32,
    pub mid: i32,
    pub high: i32,
}

impl CornerCalibration {
    pub const fn new(low: i32, mid: i32, high: i32) -> Self {
        Self { low, mid, high }
    }
}

impl From<[i32; 3]> for CornerCalibration {
    fn from(t: [i32; 3]) -> Self {
        Self::new(t[0], t[1], t[2])
    }
}

/// Calibration for all four corners. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationSet {
    corners: [CornerCalibration; 4],
}

impl CalibrationSet {
    pub fn new(corners: [CornerCalibration; 4]) -> Self {
        Self { corners }
    }

    /// Same triple on every corner.
    pub fn uniform(c: CornerCalibration) -> Self {
        Self { corners: [c; 4] }
    }

    #[inline]
    pub fn get(&self, corner: Corner) -> &CornerCalibration {
        &self.corners[corner.index()]
    }

    /// Read all twelve calibration getters from the driver.
    pub fn read_from<D: BoardDriver + ?Sized>(driver: &D) -> Self {
        let corners = Corner::ALL.map(|corner| {
            CornerCalibration::new(
                driver.calibration_value(corner, CalPoint::Low),
                driver.calibration_value(corner, CalPoint::Mid),
                driver.calibration_value(corner, CalPoint::High),
            )
        });
        Self { corners }
    }
}

impl From<&board_config::CalibrationTable> for CalibrationSet {
    fn from(t: &board_config::CalibrationTable) -> Self {
        Self::new(Corner::ALL.map(|c| CornerCalibration::from(t.get(c))))
    }
}

/// Holds the calibration of the current session.
///
/// Published sets are shared as `Arc` snapshots, so a reader never sees a
/// partially written triple. The store is cleared on every disconnect and
/// must be fetched again on reconnect.
#[derive(Debug, Default)]
pub struct CalibrationStore {
    current: RwLock<Option<Arc<CalibrationSet>>>,
}

impl CalibrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the driver for calibration and publish it.
    ///
    /// The store is left empty when the driver fails or flags its data as
    /// invalid.
    pub fn fetch<D: BoardDriver + ?Sized>(&self, driver: &mut D) -> Result<Arc<CalibrationSet>> {
        self.reset();
        let code = driver.fetch_calibration();
        codes::map_status(code, BoardError::Calibration)?;
        if !driver.is_calibration_valid() {
            return Err(BoardError::CalibrationInvalid.into());
        }
        let set = Arc::new(CalibrationSet::read_from(driver));
        tracing::debug!(?set, "calibration fetched");
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&set));
        Ok(set)
    }

    /// Whether the last fetch succeeded and has not been reset since.
    pub fn is_valid(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn current(&self) -> Option<Arc<CalibrationSet>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn reset(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
