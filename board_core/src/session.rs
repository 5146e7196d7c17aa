//! Connection lifecycle: connect, calibrate, stream, disconnect.
//!
//! State machine:
//!
//! ```text
//! Disconnected → Connecting → Calibrating → Streaming → Disconnecting → Disconnected
//!                    │             │             │
//!                    └─ failure ───┴── low battery / failure ──→ Disconnected
//! ```
//!
//! Every driver call goes through one `Mutex`, shared with the sampling
//! thread. Stopping the sampling loop happens under that lock, so once
//! `disconnect()` has taken it no further sample reaches the consumer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use board_traits::BoardDriver;
use board_traits::clock::Clock;

use crate::builder::SessionBuilder;
use crate::calibration::{CalibrationSet, CalibrationStore};
use crate::codes;
use crate::config::SamplingCfg;
use crate::error::{BoardError, Result};
use crate::mac::{self, DeviceId};
use crate::sampler::{SampleStream, SamplingLoop, StopToken};
use crate::state::{SessionState, StateCell};

fn lock<D>(driver: &Mutex<D>) -> MutexGuard<'_, D> {
    driver.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One board, one session at a time.
pub struct Session<D: BoardDriver + Send + 'static> {
    pub(crate) driver: Arc<Mutex<D>>,
    pub(crate) sampling: SamplingCfg,
    pub(crate) scan_timeout_s: u32,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) state: StateCell,
    pub(crate) calibration: Arc<CalibrationStore>,
    pub(crate) device_id: DeviceId,
    pub(crate) worker: Option<SamplingLoop>,
}

impl<D: BoardDriver + Send + 'static> core::fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state.get())
            .field("device_id", &self.device_id)
            .field("sampling", &self.sampling)
            .field("scan_timeout_s", &self.scan_timeout_s)
            .finish_non_exhaustive()
    }
}

impl<D: BoardDriver + Send + 'static> Session<D> {
    /// Start building a session.
    pub fn builder() -> SessionBuilder<D> {
        SessionBuilder::default()
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Device id of the connected board; `DeviceId::NONE` when disconnected
    /// or when the address could not be encoded.
    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    /// Calibration of the current session, if fetched.
    pub fn calibration(&self) -> Option<Arc<CalibrationSet>> {
        self.calibration.current()
    }

    pub fn sampling_cfg(&self) -> &SamplingCfg {
        &self.sampling
    }

    pub fn driver_version(&self) -> String {
        lock(&self.driver).version()
    }

    pub fn battery_level(&self) -> u8 {
        lock(&self.driver).battery_level()
    }

    /// Run `f` with exclusive access to the driver.
    pub fn with_driver<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        f(&mut lock(&self.driver))
    }

    /// Connect, calibrate and start streaming in one driver call, then start
    /// sampling.
    ///
    /// Blocks the calling thread for up to the scan timeout. Use
    /// [`Session::spawn_connect`] to keep the control thread free.
    pub fn connect(&mut self) -> Result<SampleStream> {
        self.begin_connect()?;
        let driver = Arc::clone(&self.driver);
        let code = lock(&driver).connect_calibrate_and_arm(self.scan_timeout_s);
        tracing::debug!(
            code,
            meaning = codes::describe_connect_code(code),
            "connect_calibrate_and_arm"
        );
        if let Err(e) = codes::map_connect_code(code) {
            self.state.set(SessionState::Disconnected);
            return Err(e.into());
        }
        self.state.set(SessionState::Calibrating);
        let set = self.fetch_or_abort()?;
        Ok(self.start_sampling(set))
    }

    /// Connect one step at a time: `connect_only`, calibration fetch,
    /// `start_streaming`. Sampling starts once all three succeed.
    pub fn connect_stepwise(&mut self) -> Result<SampleStream> {
        self.begin_connect()?;
        let driver = Arc::clone(&self.driver);
        let code = lock(&driver).connect_only(self.scan_timeout_s);
        tracing::debug!(code, "connect_only");
        if let Err(e) = codes::map_connect_only_code(code) {
            self.state.set(SessionState::Disconnected);
            return Err(e.into());
        }
        self.state.set(SessionState::Calibrating);
        let set = self.fetch_or_abort()?;

        let code = lock(&driver).start_streaming();
        tracing::debug!(code, "start_streaming");
        if let Err(e) = codes::map_status(code, BoardError::StartStreaming) {
            self.abort_connected();
            return Err(e.into());
        }
        Ok(self.start_sampling(set))
    }

    /// Run `connect` (or `connect_stepwise`) on its own thread. The session
    /// comes back with the result once the scan and calibration are done.
    pub fn spawn_connect(
        mut self,
        stepwise: bool,
    ) -> JoinHandle<(Self, Result<SampleStream>)> {
        std::thread::spawn(move || {
            let res = if stepwise {
                self.connect_stepwise()
            } else {
                self.connect()
            };
            (self, res)
        })
    }

    /// Stop sampling and disconnect from the board.
    ///
    /// The session always ends `Disconnected`. A failing driver disconnect
    /// is still reported as `BoardError::DisconnectFailed`.
    pub fn disconnect(&mut self) -> Result<()> {
        self.reap_finished_worker();
        if self.state.get() == SessionState::Disconnected {
            return Err(BoardError::NotConnected.into());
        }
        self.state.set(SessionState::Disconnecting);
        let driver = Arc::clone(&self.driver);
        let code = {
            let mut drv = lock(&driver);
            if let Some(w) = &self.worker {
                w.stop();
            }
            // The sampling thread may have torn the link down (low battery,
            // consumer gone) while we waited for the lock.
            if self.calibration.is_valid() {
                drv.stop_streaming();
                Some(drv.disconnect())
            } else {
                None
            }
        };
        if let Some(w) = self.worker.take() {
            w.join();
        }
        self.finish_disconnect();
        if let Some(code) = code {
            tracing::debug!(code, "disconnect");
            codes::map_status(code, BoardError::DisconnectFailed)?;
        }
        Ok(())
    }

    /// Best-effort teardown from any state. Errors are logged, not returned.
    pub fn shutdown(&mut self) {
        let was = self.state.get();
        if was == SessionState::Disconnected {
            // The sampling thread already disconnected the driver; only the thread remains.
            if let Some(w) = self.worker.take() {
                w.join();
            }
            self.device_id = DeviceId::NONE;
            return;
        }
        if let Err(e) = self.disconnect() {
            tracing::warn!(error = %e, from = %was, "disconnect failed during shutdown");
        }
    }

    fn begin_connect(&mut self) -> Result<()> {
        self.reap_finished_worker();
        let current = self.state.get();
        if current != SessionState::Disconnected {
            tracing::debug!(state = %current, "connect rejected");
            return Err(BoardError::AlreadyConnected.into());
        }
        self.state.set(SessionState::Connecting);
        Ok(())
    }

    /// Fetch calibration; on failure the board is disconnected again.
    fn fetch_or_abort(&mut self) -> Result<Arc<CalibrationSet>> {
        let driver = Arc::clone(&self.driver);
        let fetched = {
            let mut drv = lock(&driver);
            self.device_id = mac::encode(drv.device_address().as_deref());
            self.calibration.fetch(&mut *drv)
        };
        fetched.inspect_err(|e| {
            tracing::warn!(error = %e, "calibration fetch failed; disconnecting");
            self.abort_connected();
        })
    }

    /// Undo a partially established connection. The board may already be
    /// armed, so streaming is stopped first.
    fn abort_connected(&mut self) {
        let code = {
            let mut drv = lock(&self.driver);
            drv.stop_streaming();
            drv.disconnect()
        };
        if let Err(e) = codes::map_status(code, BoardError::DisconnectFailed) {
            tracing::warn!(error = %e, "disconnect after failed connect");
        }
        self.finish_disconnect();
    }

    fn start_sampling(&mut self, set: Arc<CalibrationSet>) -> SampleStream {
        let state = self.state.clone();
        let store = Arc::clone(&self.calibration);
        // Low battery or a dropped stream: the loop is gone, so is the link.
        let on_teardown = Box::new(move |drv: &mut D| {
            drv.stop_streaming();
            let code = drv.disconnect();
            if let Err(e) = codes::map_status(code, BoardError::DisconnectFailed) {
                tracing::warn!(error = %e, "disconnect after sampling ended");
            }
            store.reset();
            state.set(SessionState::Disconnected);
        });
        self.state.set(SessionState::Streaming);
        let (worker, stream) = SamplingLoop::spawn(
            Arc::clone(&self.driver),
            set,
            self.device_id,
            self.sampling,
            StopToken::new(),
            Arc::clone(&self.clock),
            on_teardown,
        );
        self.worker = Some(worker);
        tracing::info!(device_id = %self.device_id, interval = ?self.sampling.interval, "streaming");
        stream
    }

    fn finish_disconnect(&mut self) {
        self.calibration.reset();
        self.device_id = DeviceId::NONE;
        self.state.set(SessionState::Disconnected);
    }

    /// Join a worker that ended on its own (low battery, consumer gone).
    /// Its teardown hook has already disconnected the board.
    fn reap_finished_worker(&mut self) {
        if self.worker.as_ref().is_some_and(SamplingLoop::is_finished) {
            if let Some(w) = self.worker.take() {
                w.join();
            }
            if self.state.get() == SessionState::Disconnected {
                self.device_id = DeviceId::NONE;
            }
        }
    }
}

impl<D: BoardDriver + Send + 'static> Drop for Session<D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
