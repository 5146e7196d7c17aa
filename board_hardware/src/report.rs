//! Byte layouts of the board's calibration registers and balance reports.
//!
//! Both are big-endian and list the four sensors as right-top, right-bottom,
//! left-top, left-bottom. Decoded values are returned in `Corner::ALL` order.
//!
//! - calibration block: 24 bytes, three points (0, 17, 34 kg) of four `u16`
//! - balance report: 8 bytes, four `i16`

use board_traits::Corner;

use crate::error::{HwError, Result};

pub const CALIBRATION_BLOCK_LEN: usize = 24;
pub const BALANCE_REPORT_LEN: usize = 8;

/// Sensor order on the wire.
pub const WIRE_ORDER: [Corner; 4] = [
    Corner::TopRight,
    Corner::BottomRight,
    Corner::TopLeft,
    Corner::BottomLeft,
];

fn check_len(buf: &[u8], expected: usize) -> Result<()> {
    if buf.len() < expected {
        return Err(HwError::ShortBuffer {
            expected,
            got: buf.len(),
        });
    }
    Ok(())
}

#[inline]
fn be_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([buf[at], buf[at + 1]])
}

/// Decode the calibration register block into per-corner `[low, mid, high]`.
///
/// Trailing bytes are ignored.
pub fn decode_calibration_block(buf: &[u8]) -> Result<[[i32; 3]; 4]> {
    check_len(buf, CALIBRATION_BLOCK_LEN)?;
    let mut out = [[0i32; 3]; 4];
    for point in 0..3 {
        for (slot, corner) in WIRE_ORDER.iter().enumerate() {
            let at = (point * 4 + slot) * 2;
            out[corner.index()][point] = i32::from(be_u16(buf, at));
        }
    }
    tracing::trace!(?out, "calibration block decoded");
    Ok(out)
}

/// Encode per-corner `[low, mid, high]` triples as a register block.
pub fn encode_calibration_block(table: &[[i32; 3]; 4]) -> Result<[u8; CALIBRATION_BLOCK_LEN]> {
    let mut out = [0u8; CALIBRATION_BLOCK_LEN];
    for point in 0..3 {
        for (slot, corner) in WIRE_ORDER.iter().enumerate() {
            let value = table[corner.index()][point];
            let reg = u16::try_from(value).map_err(|_| HwError::CalibrationOutOfRange {
                corner: corner.name(),
                value,
            })?;
            let at = (point * 4 + slot) * 2;
            out[at..at + 2].copy_from_slice(&reg.to_be_bytes());
        }
    }
    Ok(out)
}

/// Decode one balance report into raw corner values.
pub fn decode_balance_report(buf: &[u8]) -> Result<[i32; 4]> {
    check_len(buf, BALANCE_REPORT_LEN)?;
    let mut out = [0i32; 4];
    for (slot, corner) in WIRE_ORDER.iter().enumerate() {
        let v = i16::from_be_bytes([buf[slot * 2], buf[slot * 2 + 1]]);
        out[corner.index()] = i32::from(v);
    }
    Ok(out)
}

/// Encode raw corner values, saturating at the `i16` range.
pub fn encode_balance_report(values: &[i32; 4]) -> [u8; BALANCE_REPORT_LEN] {
    let mut out = [0u8; BALANCE_REPORT_LEN];
    for (slot, corner) in WIRE_ORDER.iter().enumerate() {
        let raw = values[corner.index()];
        let v = i16::try_from(raw).unwrap_or(if raw < 0 { i16::MIN } else { i16::MAX });
        out[slot * 2..slot * 2 + 2].copy_from_slice(&v.to_be_bytes());
    }
    out
}
