#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Balance board session engine (hardware-agnostic).
//!
//! All board interactions go through the `board_traits::BoardDriver` trait.
//!
//! ## Architecture
//!
//! - **Device id**: Bluetooth address ⇄ integer codec (`mac` module)
//! - **Calibration**: per-corner three-point tables and their store (`calibration`)
//! - **Decoding**: piecewise-linear raw→kg conversion (`decoder`)
//! - **Lifecycle**: connect / calibrate / stream / disconnect (`session`)
//! - **Sampling**: one background thread per session (`sampler`)
//! - **Recording**: tab-separated sample files (`recorder`)
//! - **Runner**: drives a session end to end (`runner`)

pub mod builder;
pub mod calibration;
pub mod codes;
pub mod config;
pub mod conversions;
pub mod decoder;
pub mod error;
pub mod mac;
pub mod mocks;
pub mod recorder;
pub mod runner;
pub mod sample;
pub mod sampler;
pub mod session;
pub mod state;

pub use builder::SessionBuilder;
pub use calibration::{CalibrationSet, CalibrationStore, CornerCalibration};
pub use config::SamplingCfg;
pub use decoder::{RawReading, decode_corner, decode_total};
pub use error::{BoardError, BuildError, DecodeError, ErrorCategory, Report, Result};
pub use mac::DeviceId;
pub use recorder::{SampleRecorder, TsvRecorder};
pub use runner::{EndReason, RunOptions, RunSummary};
pub use sample::{Sample, Validity, WeightUnit};
pub use sampler::{SampleStream, StopToken};
pub use session::Session;
pub use state::SessionState;
