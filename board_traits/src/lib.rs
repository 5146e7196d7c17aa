//! Device boundary for the balance-board session engine.
//!
//! `BoardDriver` mirrors the native board module one call per primitive and
//! keeps its integer result codes as-is; the meaning of each code lives in
//! [`codes`]. Everything above this crate maps codes to typed errors.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// One of the four load sensors on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// Position in `Corner::ALL`.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomLeft => 2,
            Corner::BottomRight => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Corner::TopLeft => "top_left",
            Corner::TopRight => "top_right",
            Corner::BottomLeft => "bottom_left",
            Corner::BottomRight => "bottom_right",
        }
    }

    /// Parse the snake_case name used in calibration tables.
    pub fn from_name(s: &str) -> Option<Self> {
        Corner::ALL.into_iter().find(|c| c.name() == s)
    }
}

/// The three reference points of a corner's calibration (0, 17 and 34 kg).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalPoint {
    Low,
    Mid,
    High,
}

impl CalPoint {
    pub const ALL: [CalPoint; 3] = [CalPoint::Low, CalPoint::Mid, CalPoint::High];

    /// Reference mass in kilograms that this point was measured at.
    pub fn reference_kg(self) -> f64 {
        match self {
            CalPoint::Low => 0.0,
            CalPoint::Mid => 17.0,
            CalPoint::High => 34.0,
        }
    }
}

/// Result codes returned by the native board module.
pub mod codes {
    /// `connect_calibrate_and_arm` succeeded; also `connect_only` connected.
    pub const OPERATION_SUCCESSFUL: i32 = 1;
    pub const GENERAL_ERROR: i32 = -1;
    pub const NEGATIVE_DEVICE_COUNT: i32 = -2;
    pub const CONNECTION_OBJECT_FAILED: i32 = -3;
    pub const OPEN_CONNECTION_FAILED: i32 = -4;
    pub const NO_DEVICE_FOUND: i32 = -5;
    pub const CONNECTION_CREATION_FAILED: i32 = -6;
    pub const BATTERY_LOW: i32 = -7;

    /// `connect_only`: scan finished without a board in range.
    pub const NO_DEVICE_IN_RANGE: i32 = 0;

    /// `fetch_calibration`, `start_streaming`, `disconnect`.
    pub const STATUS_OK: i32 = 0;
    pub const STATUS_FAILED: i32 = -1;
}

/// Native board primitives consumed by the session engine.
///
/// Calls are blocking. Implementations need not be thread-safe beyond
/// `Send`; the engine serializes every call behind a lock.
pub trait BoardDriver {
    /// Identification string of the native module.
    fn version(&self) -> String;

    /// Scan, connect, read calibration and enable continuous reporting.
    fn connect_calibrate_and_arm(&mut self, scan_timeout_s: u32) -> i32;

    /// Scan and connect only.
    fn connect_only(&mut self, scan_timeout_s: u32) -> i32;

    fn fetch_calibration(&mut self) -> i32;
    fn start_streaming(&mut self) -> i32;
    fn stop_streaming(&mut self);
    fn disconnect(&mut self) -> i32;

    fn is_calibration_valid(&self) -> bool;
    fn is_balance_data_valid(&self) -> bool;

    fn calibration_value(&self, corner: Corner, point: CalPoint) -> i32;
    fn live_value(&self, corner: Corner) -> i32;

    /// Raw battery byte as last reported by the board.
    fn battery_level(&self) -> u8;

    /// Bluetooth address of the connected board, if any.
    fn device_address(&self) -> Option<String>;
}

impl<T: BoardDriver + ?Sized> BoardDriver for Box<T> {
    fn version(&self) -> String {
        (**self).version()
    }
    fn connect_calibrate_and_arm(&mut self, scan_timeout_s: u32) -> i32 {
        (**self).connect_calibrate_and_arm(scan_timeout_s)
    }
    fn connect_only(&mut self, scan_timeout_s: u32) -> i32 {
        (**self).connect_only(scan_timeout_s)
    }
    fn fetch_calibration(&mut self) -> i32 {
        (**self).fetch_calibration()
    }
    fn start_streaming(&mut self) -> i32 {
        (**self).start_streaming()
    }
    fn stop_streaming(&mut self) {
        (**self).stop_streaming();
    }
    fn disconnect(&mut self) -> i32 {
        (**self).disconnect()
    }
    fn is_calibration_valid(&self) -> bool {
        (**self).is_calibration_valid()
    }
    fn is_balance_data_valid(&self) -> bool {
        (**self).is_balance_data_valid()
    }
    fn calibration_value(&self, corner: Corner, point: CalPoint) -> i32 {
        (**self).calibration_value(corner, point)
    }
    fn live_value(&self, corner: Corner) -> i32 {
        (**self).live_value(corner)
    }
    fn battery_level(&self) -> u8 {
        (**self).battery_level()
    }
    fn device_address(&self) -> Option<String> {
        (**self).device_address()
    }
}
