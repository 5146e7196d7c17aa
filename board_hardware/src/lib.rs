//! Driver adapters for `board_traits::BoardDriver`.
//!
//! Only the simulated board lives here; a radio-backed adapter plugs in
//! behind the same trait.

pub mod error;
pub mod report;

use std::cell::Cell;

use board_traits::{BoardDriver, CalPoint, Corner, codes};

use crate::error::Result;
use crate::report::{
    BALANCE_REPORT_LEN, CALIBRATION_BLOCK_LEN, decode_balance_report, decode_calibration_block,
    encode_balance_report, encode_calibration_block,
};

/// Calibration of a typical board, corner order `Corner::ALL`.
pub const DEFAULT_CALIBRATION: [[i32; 3]; 4] = [
    [1_310, 9_020, 16_880],
    [1_200, 8_900, 16_700],
    [980, 8_650, 16_300],
    [1_050, 8_700, 16_400],
];

/// Total weight the simulated board reports once its battery is drained.
pub const DRAINED_WEIGHT_KG: f64 = -60.0;

/// Default Bluetooth address of the simulated board.
pub const DEFAULT_ADDRESS: &str = "00:1B:7A:4C:2D:9E";

/// Raw value that decodes to `kg` on one corner; inverse of the
/// piecewise-linear calibration map.
fn raw_for_kg(kg: f64, cal: [i32; 3]) -> i32 {
    let [low, mid, high] = cal.map(f64::from);
    let raw = if kg < 17.0 {
        low + kg * (mid - low) / 17.0
    } else {
        mid + (kg - 17.0) * (high - mid) / 17.0
    };
    let raw = raw.round();
    if raw >= f64::from(i32::MAX) {
        i32::MAX
    } else if raw <= f64::from(i32::MIN) {
        i32::MIN
    } else {
        raw as i32
    }
}

/// In-process stand-in for a balance board.
///
/// Calibration is kept as the 24-byte register image and every tick is
/// rendered into an 8-byte balance report, so reads go through the same
/// byte codecs a radio adapter would use. The load is spread evenly over the
/// four corners.
#[derive(Debug)]
pub struct SimulatedBoard {
    registers: [u8; CALIBRATION_BLOCK_LEN],
    calibration: Option<[[i32; 3]; 4]>,
    weight_kg: f64,
    connect_code: i32,
    drain_after: Option<u64>,
    address: Option<String>,
    connected: bool,
    streaming: bool,
    ticks: Cell<u64>,
    report: Cell<[u8; BALANCE_REPORT_LEN]>,
}

impl SimulatedBoard {
    /// Board whose registers hold `table`. Every value must fit in a `u16`.
    pub fn new(table: [[i32; 3]; 4]) -> Result<Self> {
        let registers = encode_calibration_block(&table)?;
        Ok(Self {
            registers,
            calibration: None,
            weight_kg: 0.0,
            connect_code: codes::OPERATION_SUCCESSFUL,
            drain_after: None,
            address: Some(DEFAULT_ADDRESS.to_string()),
            connected: false,
            streaming: false,
            ticks: Cell::new(0),
            report: Cell::new([0; BALANCE_REPORT_LEN]),
        })
    }

    /// Total load standing on the board.
    pub fn with_weight_kg(mut self, kg: f64) -> Self {
        self.weight_kg = kg;
        self
    }

    /// Result code of the next connect attempt.
    pub fn with_connect_code(mut self, code: i32) -> Self {
        self.connect_code = code;
        self
    }

    /// After `ticks` balance reports the battery sags and the board reports
    /// [`DRAINED_WEIGHT_KG`].
    pub fn with_drain_after(mut self, ticks: u64) -> Self {
        self.drain_after = Some(ticks);
        self
    }

    pub fn with_address(mut self, address: Option<&str>) -> Self {
        self.address = address.map(str::to_string);
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn drained(&self) -> bool {
        self.drain_after.is_some_and(|n| self.ticks.get() >= n)
    }

    /// Render the next balance report from the current load.
    fn refresh_report(&self) {
        let Some(cal) = self.calibration else {
            return;
        };
        let total = if self.drained() {
            DRAINED_WEIGHT_KG
        } else {
            self.weight_kg
        };
        let per_corner = total / 4.0;
        let raw = Corner::ALL.map(|c| raw_for_kg(per_corner, cal[c.index()]));
        self.report.set(encode_balance_report(&raw));
        self.ticks.set(self.ticks.get().saturating_add(1));
        tracing::trace!(total, ?raw, "simulated report");
    }

    fn load_calibration(&mut self) -> i32 {
        match decode_calibration_block(&self.registers) {
            Ok(table) => {
                self.calibration = Some(table);
                codes::STATUS_OK
            }
            Err(e) => {
                tracing::warn!(error = %e, "calibration registers unreadable");
                self.calibration = None;
                codes::STATUS_FAILED
            }
        }
    }
}

impl BoardDriver for SimulatedBoard {
    fn version(&self) -> String {
        format!("simulated-board {}", env!("CARGO_PKG_VERSION"))
    }

    fn connect_calibrate_and_arm(&mut self, scan_timeout_s: u32) -> i32 {
        tracing::debug!(scan_timeout_s, code = self.connect_code, "simulated connect");
        if self.connect_code != codes::OPERATION_SUCCESSFUL {
            return self.connect_code;
        }
        self.connected = true;
        if self.load_calibration() != codes::STATUS_OK {
            self.connected = false;
            return codes::GENERAL_ERROR;
        }
        self.streaming = true;
        codes::OPERATION_SUCCESSFUL
    }

    fn connect_only(&mut self, scan_timeout_s: u32) -> i32 {
        tracing::debug!(scan_timeout_s, code = self.connect_code, "simulated connect_only");
        match self.connect_code {
            codes::OPERATION_SUCCESSFUL => {
                self.connected = true;
                codes::OPERATION_SUCCESSFUL
            }
            codes::NO_DEVICE_FOUND => codes::NO_DEVICE_IN_RANGE,
            other => other,
        }
    }

    fn fetch_calibration(&mut self) -> i32 {
        if !self.connected {
            return codes::STATUS_FAILED;
        }
        self.load_calibration()
    }

    fn start_streaming(&mut self) -> i32 {
        if !self.connected || self.calibration.is_none() {
            return codes::STATUS_FAILED;
        }
        self.streaming = true;
        codes::STATUS_OK
    }

    fn stop_streaming(&mut self) {
        self.streaming = false;
    }

    fn disconnect(&mut self) -> i32 {
        self.streaming = false;
        self.connected = false;
        self.calibration = None;
        codes::STATUS_OK
    }

    fn is_calibration_valid(&self) -> bool {
        self.calibration.is_some()
    }

    fn is_balance_data_valid(&self) -> bool {
        if !(self.connected && self.streaming) {
            return false;
        }
        self.refresh_report();
        true
    }

    fn calibration_value(&self, corner: Corner, point: CalPoint) -> i32 {
        let Some(cal) = self.calibration else {
            return 0;
        };
        let idx = match point {
            CalPoint::Low => 0,
            CalPoint::Mid => 1,
            CalPoint::High => 2,
        };
        cal[corner.index()][idx]
    }

    fn live_value(&self, corner: Corner) -> i32 {
        decode_balance_report(&self.report.get()).map_or(0, |v| v[corner.index()])
    }

    fn battery_level(&self) -> u8 {
        if self.drained() { 2 } else { 87 }
    }

    fn device_address(&self) -> Option<String> {
        self.address.clone()
    }
}
