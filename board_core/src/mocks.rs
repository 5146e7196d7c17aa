//! Test and helper mocks for board_core

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use board_traits::{BoardDriver, CalPoint, Corner, codes};

#[derive(Debug)]
struct Shared {
    live: Mutex<[i32; 4]>,
    balance_valid: AtomicBool,
    connected: AtomicBool,
    corner_reads: AtomicUsize,
    validity_checks: AtomicUsize,
    disconnect_calls: AtomicUsize,
    stop_calls: AtomicUsize,
}

/// Scriptable in-memory board.
///
/// Every operation succeeds by default, calibration is `(0, 100, 200)` on
/// all corners and each corner reports 100, so a fresh board weighs 68 kg.
#[derive(Debug)]
pub struct FakeBoard {
    connect_code: i32,
    connect_only_code: i32,
    fetch_code: i32,
    start_code: i32,
    disconnect_code: i32,
    calibration: [[i32; 3]; 4],
    calibration_valid: bool,
    address: Option<String>,
    shared: Arc<Shared>,
}

impl Default for FakeBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBoard {
    pub fn new() -> Self {
        Self {
            connect_code: codes::OPERATION_SUCCESSFUL,
            connect_only_code: codes::OPERATION_SUCCESSFUL,
            fetch_code: codes::STATUS_OK,
            start_code: codes::STATUS_OK,
            disconnect_code: codes::STATUS_OK,
            calibration: [[0, 100, 200]; 4],
            calibration_valid: true,
            address: Some("00:1B:7A:4C:2D:9E".to_string()),
            shared: Arc::new(Shared {
                live: Mutex::new([100; 4]),
                balance_valid: AtomicBool::new(true),
                connected: AtomicBool::new(false),
                corner_reads: AtomicUsize::new(0),
                validity_checks: AtomicUsize::new(0),
                disconnect_calls: AtomicUsize::new(0),
                stop_calls: AtomicUsize::new(0),
            }),
        }
    }

    pub fn with_connect_code(mut self, code: i32) -> Self {
        self.connect_code = code;
        self
    }

    pub fn with_connect_only_code(mut self, code: i32) -> Self {
        self.connect_only_code = code;
        self
    }

    pub fn with_fetch_code(mut self, code: i32) -> Self {
        self.fetch_code = code;
        self
    }

    pub fn with_start_code(mut self, code: i32) -> Self {
        self.start_code = code;
        self
    }

    pub fn with_disconnect_code(mut self, code: i32) -> Self {
        self.disconnect_code = code;
        self
    }

    /// Triples in corner order: top-left, top-right, bottom-left, bottom-right.
    pub fn with_calibration(mut self, table: [[i32; 3]; 4]) -> Self {
        self.calibration = table;
        self
    }

    pub fn with_calibration_valid(mut self, valid: bool) -> Self {
        self.calibration_valid = valid;
        self
    }

    pub fn with_address(mut self, address: Option<&str>) -> Self {
        self.address = address.map(str::to_string);
        self
    }

    pub fn with_live(self, values: [i32; 4]) -> Self {
        self.handle().set_live(values);
        self
    }

    pub fn with_balance_valid(self, valid: bool) -> Self {
        self.handle().set_balance_valid(valid);
        self
    }

    /// Handle that stays usable after the board moved into a session.
    pub fn handle(&self) -> FakeBoardHandle {
        FakeBoardHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Observes and steers a [`FakeBoard`] from outside the session.
#[derive(Debug, Clone)]
pub struct FakeBoardHandle {
    shared: Arc<Shared>,
}

impl FakeBoardHandle {
    pub fn set_live(&self, values: [i32; 4]) {
        *self.shared.live.lock().unwrap_or_else(PoisonError::into_inner) = values;
    }

    pub fn set_balance_valid(&self, valid: bool) {
        self.shared.balance_valid.store(valid, Ordering::SeqCst);
    }

    /// Number of `live_value` calls so far.
    pub fn corner_reads(&self) -> usize {
        self.shared.corner_reads.load(Ordering::SeqCst)
    }

    pub fn validity_checks(&self) -> usize {
        self.shared.validity_checks.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.shared.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.shared.stop_calls.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }
}

impl BoardDriver for FakeBoard {
    fn version(&self) -> String {
        "fake-board 1.0".to_string()
    }

    fn connect_calibrate_and_arm(&mut self, _scan_timeout_s: u32) -> i32 {
        if self.connect_code == codes::OPERATION_SUCCESSFUL {
            self.shared.connected.store(true, Ordering::SeqCst);
        }
        self.connect_code
    }

    fn connect_only(&mut self, _scan_timeout_s: u32) -> i32 {
        if self.connect_only_code == codes::OPERATION_SUCCESSFUL {
            self.shared.connected.store(true, Ordering::SeqCst);
        }
        self.connect_only_code
    }

    fn fetch_calibration(&mut self) -> i32 {
        self.fetch_code
    }

    fn start_streaming(&mut self) -> i32 {
        self.start_code
    }

    fn stop_streaming(&mut self) {
        self.shared.stop_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn disconnect(&mut self) -> i32 {
        self.shared.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.shared.connected.store(false, Ordering::SeqCst);
        self.disconnect_code
    }

    fn is_calibration_valid(&self) -> bool {
        self.calibration_valid
    }

    fn is_balance_data_valid(&self) -> bool {
        self.shared.validity_checks.fetch_add(1, Ordering::SeqCst);
        self.shared.balance_valid.load(Ordering::SeqCst)
    }

    fn calibration_value(&self, corner: Corner, point: CalPoint) -> i32 {
        let idx = match point {
            CalPoint::Low => 0,
            CalPoint::Mid => 1,
            CalPoint::High => 2,
        };
        self.calibration[corner.index()][idx]
    }

    fn live_value(&self, corner: Corner) -> i32 {
        self.shared.corner_reads.fetch_add(1, Ordering::SeqCst);
        self.shared.live.lock().unwrap_or_else(PoisonError::into_inner)[corner.index()]
    }

    fn battery_level(&self) -> u8 {
        100
    }

    fn device_address(&self) -> Option<String> {
        self.address.clone()
    }
}
