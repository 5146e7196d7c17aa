use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use board_traits::BoardDriver;
use crossbeam_channel::RecvTimeoutError;

use crate::error::{BoardError, Result as CoreResult};
use crate::mac::DeviceId;
use crate::recorder::SampleRecorder;
use crate::sample::{Sample, Validity};
use crate::session::Session;

/// How often the shutdown flag is checked while waiting for a sample.
const POLL: Duration = Duration::from_millis(100);

/// How a run should connect and when it should stop on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Stop after this many samples of any validity.
    pub max_samples: Option<u64>,
    /// Use `connect_stepwise` instead of `connect`.
    pub stepwise: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The external shutdown flag was raised.
    Shutdown,
    SampleBudget,
    LowBattery,
    /// The sampling loop ended without a low-battery sample.
    StreamClosed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub valid: u64,
    pub invalid: u64,
    pub low_battery: u64,
    pub recorded: u64,
    pub last_valid_kg: Option<f64>,
    pub device_id: DeviceId,
    pub ended_by: EndReason,
}

impl RunSummary {
    fn new(device_id: DeviceId) -> Self {
        Self {
            valid: 0,
            invalid: 0,
            low_battery: 0,
            recorded: 0,
            last_valid_kg: None,
            device_id,
            ended_by: EndReason::StreamClosed,
        }
    }

    pub fn total(&self) -> u64 {
        self.valid + self.invalid + self.low_battery
    }

    fn count(&mut self, s: &Sample) {
        match s.validity {
            Validity::Valid => {
                self.valid += 1;
                self.last_valid_kg = s.total_weight_kg;
            }
            Validity::Invalid => self.invalid += 1,
            Validity::LowBattery => self.low_battery += 1,
        }
    }
}

/// Drive one session from connect to disconnect.
///
/// Every received sample is counted, handed to `recorder` (if any) and then
/// to `on_sample`. The session is disconnected before returning unless the
/// board already dropped it.
pub fn run<D, F>(
    session: &mut Session<D>,
    options: RunOptions,
    shutdown: &AtomicBool,
    mut recorder: Option<&mut dyn SampleRecorder>,
    mut on_sample: F,
) -> CoreResult<RunSummary>
where
    D: BoardDriver + Send + 'static,
    F: FnMut(&Sample),
{
    let stream = if options.stepwise {
        session.connect_stepwise()?
    } else {
        session.connect()?
    };
    let mut summary = RunSummary::new(session.device_id());
    tracing::info!(device_id = %summary.device_id, stepwise = options.stepwise, "run start");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            summary.ended_by = EndReason::Shutdown;
            break;
        }
        let sample = match stream.recv_timeout(POLL) {
            Ok(s) => s,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                summary.ended_by = EndReason::StreamClosed;
                break;
            }
        };
        summary.count(&sample);
        if let Some(rec) = recorder.as_deref_mut() {
            match rec.record(&sample) {
                Ok(true) => summary.recorded += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(error = %e, "failed to record sample"),
            }
        }
        on_sample(&sample);

        if sample.validity == Validity::LowBattery {
            summary.ended_by = EndReason::LowBattery;
            break;
        }
        if options.max_samples.is_some_and(|n| summary.total() >= n) {
            summary.ended_by = EndReason::SampleBudget;
            break;
        }
    }

    // Low battery has already torn the connection down.
    if summary.ended_by == EndReason::LowBattery {
        session.shutdown();
    } else {
        finish(session)?;
    }
    tracing::info!(
        valid = summary.valid,
        invalid = summary.invalid,
        low_battery = summary.low_battery,
        ended_by = ?summary.ended_by,
        "run complete"
    );
    Ok(summary)
}

/// Disconnect at the end of a run. The sampling thread may have ended the
/// session on its own since the last sample, which counts as done.
fn finish<D: BoardDriver + Send + 'static>(session: &mut Session<D>) -> CoreResult<()> {
    match session.disconnect() {
        Err(e) if matches!(e.downcast_ref::<BoardError>(), Some(BoardError::NotConnected)) => {
            tracing::debug!("session already ended by the sampling thread");
            Ok(())
        }
        other => other,
    }
}
