//! Maps native driver result codes to typed `BoardError`s.
//!
//! The codes themselves are defined in `board_traits::codes`; this module is
//! the only place that interprets them.

use crate::error::{BoardError, ErrorCategory};
use board_traits::codes::*;

/// Category for a failed connect attempt.
///
/// `-7` is the battery; `-5` is an empty scan; everything else, including
/// codes the driver is not documented to return, is a transport failure.
pub fn category_for_connect_code(code: i32) -> ErrorCategory {
    match code {
        BATTERY_LOW => ErrorCategory::Battery,
        NO_DEVICE_FOUND => ErrorCategory::DeviceNotFound,
        _ => ErrorCategory::Bluetooth,
    }
}

/// Short description of a connect code for logs.
pub fn describe_connect_code(code: i32) -> &'static str {
    match code {
        OPERATION_SUCCESSFUL => "success",
        GENERAL_ERROR => "general error",
        NEGATIVE_DEVICE_COUNT => "negative device count",
        CONNECTION_OBJECT_FAILED => "connection object creation failed",
        OPEN_CONNECTION_FAILED => "open connection failed",
        NO_DEVICE_FOUND => "no device found",
        CONNECTION_CREATION_FAILED => "connection creation failed",
        BATTERY_LOW => "battery critically low",
        _ => "unknown result code",
    }
}

/// Interpret `connect_calibrate_and_arm`.
pub fn map_connect_code(code: i32) -> Result<(), BoardError> {
    if code == OPERATION_SUCCESSFUL {
        return Ok(());
    }
    Err(BoardError::Connect {
        code,
        category: category_for_connect_code(code),
    })
}

/// Interpret `connect_only`, where `0` means nothing was in range.
pub fn map_connect_only_code(code: i32) -> Result<(), BoardError> {
    match code {
        OPERATION_SUCCESSFUL => Ok(()),
        NO_DEVICE_IN_RANGE => Err(BoardError::Connect {
            code,
            category: ErrorCategory::DeviceNotFound,
        }),
        _ => Err(BoardError::Connect {
            code,
            category: ErrorCategory::Bluetooth,
        }),
    }
}

/// Interpret a `0`/`-1` status code, building the error with `err`.
pub fn map_status(code: i32, err: impl FnOnce(i32) -> BoardError) -> Result<(), BoardError> {
    if code == STATUS_OK {
        Ok(())
    } else {
        Err(err(code))
    }
}
