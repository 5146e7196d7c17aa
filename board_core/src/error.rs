use std::fmt;
use thiserror::Error;

/// Coarse, user-facing class of a driver failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The board reported (or implied) a critically low battery.
    Battery,
    /// Any transport or general driver failure.
    Bluetooth,
    /// The scan finished without finding a board.
    DeviceNotFound,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::Battery => "battery",
            ErrorCategory::Bluetooth => "bluetooth",
            ErrorCategory::DeviceNotFound => "device-not-found",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("connect failed ({category}): driver code {code}")]
    Connect { code: i32, category: ErrorCategory },
    #[error("calibration fetch failed: driver code {0}")]
    Calibration(i32),
    #[error("calibration data reported invalid by the board")]
    CalibrationInvalid,
    #[error("start streaming failed: driver code {0}")]
    StartStreaming(i32),
    #[error("disconnect failed: driver code {0}")]
    DisconnectFailed(i32),
    #[error("already connected to a board")]
    AlreadyConnected,
    #[error("not connected to a board")]
    NotConnected,
}

impl BoardError {
    /// Presentation category, when the error came from the driver.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            BoardError::Connect { category, .. } => Some(*category),
            BoardError::Calibration(_)
            | BoardError::CalibrationInvalid
            | BoardError::StartStreaming(_)
            | BoardError::DisconnectFailed(_) => Some(ErrorCategory::Bluetooth),
            BoardError::AlreadyConnected | BoardError::NotConnected => None,
        }
    }
}

/// Failure to turn a raw reading into a weight.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("degenerate calibration span {lower}..{upper}")]
    DegenerateSpan { lower: i32, upper: i32 },
    #[error("decoded weight is not finite")]
    NonFinite,
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing board driver")]
    MissingDriver,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
