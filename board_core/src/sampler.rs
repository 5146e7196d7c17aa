//! Background sampling loop.
//!
//! Spawns one thread per session that reads the board every interval,
//! decodes and classifies the reading, and pushes a `Sample` to the
//! consumer over a channel.
//!
//! Each tick runs with the driver lock held: the stop check, the reads and
//! the send all happen in one critical section. A stop requested under the
//! same lock therefore guarantees no further sample is sent.
//!
//! Safety: the thread is shut down and joined when the `SamplingLoop` is
//! dropped.
use crossbeam_channel as xch;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use board_traits::BoardDriver;
use board_traits::clock::Clock;

use crate::calibration::CalibrationSet;
use crate::config::SamplingCfg;
use crate::decoder::{RawReading, decode_total};
use crate::mac::DeviceId;
use crate::sample::{Sample, Validity, classify, timestamp_from_unix_ms};

/// Cancellation token for one sampling loop.
///
/// Setting it is terminal. A wake channel lets the loop's wait between ticks
/// return as soon as the token is set.
#[derive(Debug, Clone)]
pub struct StopToken {
    stopped: Arc<AtomicBool>,
    wake_tx: xch::Sender<()>,
    wake_rx: xch::Receiver<()>,
}

impl Default for StopToken {
    fn default() -> Self {
        Self::new()
    }
}

impl StopToken {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = xch::bounded(1);
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
            wake_tx,
            wake_rx,
        }
    }

    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            let _ = self.wake_tx.try_send(());
        }
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Wait up to `d`; returns true if the token was set.
    pub fn wait(&self, d: Duration) -> bool {
        if self.is_stopped() {
            return true;
        }
        match self.wake_rx.recv_timeout(d) {
            Ok(()) => true,
            Err(xch::RecvTimeoutError::Timeout) => self.is_stopped(),
            Err(xch::RecvTimeoutError::Disconnected) => true,
        }
    }
}

/// Consumer side of the sample channel.
#[derive(Debug)]
pub struct SampleStream {
    rx: xch::Receiver<Sample>,
}

impl SampleStream {
    pub fn recv(&self) -> Option<Sample> {
        self.rx.recv().ok()
    }

    pub fn recv_timeout(&self, d: Duration) -> Result<Sample, xch::RecvTimeoutError> {
        self.rx.recv_timeout(d)
    }

    pub fn try_recv(&self) -> Option<Sample> {
        self.rx.try_recv().ok()
    }

    /// Drain everything queued so far.
    pub fn drain(&self) -> Vec<Sample> {
        self.rx.try_iter().collect()
    }
}

impl IntoIterator for SampleStream {
    type Item = Sample;
    type IntoIter = xch::IntoIter<Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.rx.into_iter()
    }
}

/// Runs once, with the driver still locked, when the loop ends on its own:
/// after a `LowBattery` sample was sent, or when the consumer went away.
/// Not run when the loop is stopped through its token.
pub type TeardownHook<D> = Box<dyn FnOnce(&mut D) + Send>;

/// Read one tick's worth of data and classify it.
///
/// Corner values are only read when the board reports valid balance data.
pub fn read_and_classify<D: BoardDriver + ?Sized>(
    driver: &D,
    calibration: &CalibrationSet,
    low_battery_threshold_kg: f64,
) -> (Option<f64>, Validity) {
    if !driver.is_balance_data_valid() {
        return (None, Validity::Invalid);
    }
    let reading = RawReading::read_from(driver);
    match decode_total(&reading, calibration) {
        Ok(total) => (Some(total), classify(total, low_battery_threshold_kg)),
        Err(e) => {
            tracing::debug!(error = %e, ?reading, "reading not decodable");
            (None, Validity::Invalid)
        }
    }
}

pub struct SamplingLoop {
    stop: StopToken,
    /// Join handle for graceful thread cleanup
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl SamplingLoop {
    pub fn spawn<D>(
        driver: Arc<Mutex<D>>,
        calibration: Arc<CalibrationSet>,
        device_id: DeviceId,
        cfg: SamplingCfg,
        stop: StopToken,
        clock: Arc<dyn Clock + Send + Sync>,
        on_teardown: TeardownHook<D>,
    ) -> (Self, SampleStream)
    where
        D: BoardDriver + Send + 'static,
    {
        let (tx, rx) = xch::unbounded();
        let token = stop.clone();

        let join_handle = std::thread::spawn(move || {
            let mut on_teardown = Some(on_teardown);
            let mut seq: u64 = 0;
            loop {
                let tick_start = clock.now();
                {
                    let mut drv = driver.lock().unwrap_or_else(PoisonError::into_inner);
                    if token.is_stopped() {
                        tracing::debug!("sampling loop received stop signal");
                        break;
                    }

                    let (weight, validity) =
                        read_and_classify(&*drv, &calibration, cfg.low_battery_threshold_kg);
                    let sample = Sample {
                        seq,
                        timestamp: timestamp_from_unix_ms(clock.unix_ms()),
                        device_id,
                        total_weight_kg: weight,
                        validity,
                    };
                    seq += 1;
                    tracing::trace!(seq = sample.seq, ?validity, weight, "tick");

                    let ended = if tx.send(sample).is_err() {
                        tracing::debug!("sample consumer disconnected; ending session");
                        true
                    } else if validity == Validity::LowBattery {
                        tracing::warn!(weight, "low battery inferred from weight; ending session");
                        true
                    } else {
                        false
                    };
                    if ended {
                        token.stop();
                        if let Some(hook) = on_teardown.take() {
                            hook(&mut *drv);
                        }
                        break;
                    }
                }

                let elapsed = clock.now().saturating_duration_since(tick_start);
                if token.wait(cfg.interval.saturating_sub(elapsed)) {
                    break;
                }
            }
            tracing::trace!("sampling thread exiting cleanly");
        });

        (
            Self {
                stop,
                join_handle: Some(join_handle),
            },
            SampleStream { rx },
        )
    }

    /// Request a stop without waiting for the thread.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn token(&self) -> &StopToken {
        &self.stop
    }

    /// True once the worker thread has returned.
    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .is_none_or(std::thread::JoinHandle::is_finished)
    }

    /// Stop and wait for the thread to exit.
    pub fn join(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.stop();
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("sampling thread joined successfully");
                }
                Err(e) => {
                    // Thread panicked; log but don't propagate
                    tracing::warn!(?e, "sampling thread panicked during shutdown");
                }
            }
        }
    }
}

impl Drop for SamplingLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}
