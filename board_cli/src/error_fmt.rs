//! Human-readable error descriptions and structured JSON error formatting.

use board_core::error::{BoardError, BuildError, ErrorCategory};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingDriver => {
                "What happened: No board driver was provided to the session.\nLikely causes: The simulated board failed to initialize.\nHow to fix: Check the calibration CSV and re-run with --log-level=debug.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BoardError>() {
        return match be {
            BoardError::Connect {
                category: ErrorCategory::Battery,
                ..
            } => "What happened: The board reported a critically low battery.\nLikely causes: Worn out batteries.\nHow to fix: Replace the board's batteries and connect again.".to_string(),
            BoardError::Connect {
                category: ErrorCategory::DeviceNotFound,
                ..
            } => "What happened: No board was found during the scan.\nLikely causes: The board is off, out of range, or not in pairing mode.\nHow to fix: Press the board's sync button and retry; consider raising board.scan_timeout_s.".to_string(),
            BoardError::Connect { code, .. } => format!(
                "What happened: The Bluetooth connection failed (driver code {code}).\nLikely causes: Adapter off, pairing lost, or interference.\nHow to fix: Check that Bluetooth is enabled and retry."
            ),
            BoardError::Calibration(_) | BoardError::CalibrationInvalid => "What happened: The board's calibration could not be read.\nLikely causes: The connection dropped while reading calibration.\nHow to fix: Reconnect; calibration is fetched on every connect.".to_string(),
            BoardError::StartStreaming(code) => format!(
                "What happened: The board refused to start streaming (driver code {code}).\nLikely causes: The connection dropped after calibration.\nHow to fix: Reconnect and try again."
            ),
            BoardError::DisconnectFailed(code) => format!(
                "What happened: The board did not acknowledge the disconnect (driver code {code}).\nLikely causes: The link was already gone.\nHow to fix: Nothing to do; the session is closed."
            ),
            BoardError::AlreadyConnected | BoardError::NotConnected => format!(
                "What happened: {be}.\nHow to fix: Re-run with --log-level=debug for details."
            ),
        };
    }

    // String-based heuristics for errors coming from config or calibration files
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("calibration csv must have headers") {
        return "Invalid headers in calibration CSV. Expected 'corner,low,mid,high'.".to_string();
    }

    if lower.contains("invalid configuration") || lower.contains("parse config") {
        return "What happened: Configuration is invalid or incomplete.\nLikely causes: Out-of-range values or a malformed TOML file.\nHow to fix: Edit the TOML config and try again.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

fn category_of(err: &eyre::Report) -> Option<ErrorCategory> {
    err.downcast_ref::<BoardError>().and_then(BoardError::category)
}

/// Stable exit codes per error category; everything else is 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match category_of(err) {
        Some(ErrorCategory::Battery) => 3,
        Some(ErrorCategory::DeviceNotFound) => 4,
        Some(ErrorCategory::Bluetooth) => 5,
        None => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let msg = humanize(err);
    if let Some(be) = err.downcast_ref::<BoardError>() {
        let code = match be {
            BoardError::Connect { code, .. }
            | BoardError::Calibration(code)
            | BoardError::StartStreaming(code)
            | BoardError::DisconnectFailed(code) => Some(*code),
            _ => None,
        };
        let category = be.category().map(|c| c.to_string());
        return json!({
            "reason": "BoardError",
            "category": category,
            "code": code,
            "message": msg,
        })
        .to_string();
    }

    // Generic error JSON
    json!({ "reason": "Error", "message": msg }).to_string()
}
