use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HwError {
    #[error("short report: expected {expected} bytes, got {got}")]
    ShortBuffer { expected: usize, got: usize },
    #[error("calibration value {value} for {corner} does not fit a 16-bit register")]
    CalibrationOutOfRange { corner: &'static str, value: i32 },
}

pub type Result<T> = std::result::Result<T, HwError>;
