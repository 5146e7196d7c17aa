//! Raw corner readings → calibrated weight.
//!
//! Each corner is a two-segment piecewise-linear map through its three
//! calibration points (0, 17 and 34 kg):
//!
//! ```text
//! raw <  mid:  w =  0 + (raw - low) * 17 / (mid - low)
//! raw >= mid:  w = 17 + (raw - mid) * 17 / (high - mid)
//! ```
//!
//! The total is the plain sum of the four corners in `f64`. No rounding
//! happens here.

use board_traits::{BoardDriver, CalPoint, Corner};

use crate::calibration::{CalibrationSet, CornerCalibration};
use crate::error::DecodeError;

/// Mass difference between two adjacent calibration points, in kg.
pub const SEGMENT_KG: f64 = 17.0;

/// Four raw values captured in one driver critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawReading {
    values: [i32; 4],
}

impl RawReading {
    pub fn new(top_left: i32, top_right: i32, bottom_left: i32, bottom_right: i32) -> Self {
        Self {
            values: [top_left, top_right, bottom_left, bottom_right],
        }
    }

    /// Same raw value on every corner.
    pub fn uniform(raw: i32) -> Self {
        Self { values: [raw; 4] }
    }

    #[inline]
    pub fn get(&self, corner: Corner) -> i32 {
        self.values[corner.index()]
    }

    /// Read the four live values. The caller must hold the driver for the
    /// whole call so the values belong to the same report.
    pub fn read_from<D: BoardDriver + ?Sized>(driver: &D) -> Self {
        Self {
            values: Corner::ALL.map(|c| driver.live_value(c)),
        }
    }
}

/// Decode one corner against its calibration triple.
///
/// A zero or negative span on the segment in use is reported instead of
/// dividing by it.
pub fn decode_corner(raw: i32, cal: &CornerCalibration) -> Result<f64, DecodeError> {
    let (base, from, to) = if raw < cal.mid {
        (CalPoint::Low.reference_kg(), cal.low, cal.mid)
    } else {
        (CalPoint::Mid.reference_kg(), cal.mid, cal.high)
    };
    let span = f64::from(to) - f64::from(from);
    if span <= 0.0 {
        return Err(DecodeError::DegenerateSpan {
            lower: from,
            upper: to,
        });
    }
    let w = base + (f64::from(raw) - f64::from(from)) * SEGMENT_KG / span;
    if w.is_finite() {
        Ok(w)
    } else {
        Err(DecodeError::NonFinite)
    }
}

/// Total weight over all four corners.
pub fn decode_total(reading: &RawReading, cal: &CalibrationSet) -> Result<f64, DecodeError> {
    let mut total = 0.0f64;
    for corner in Corner::ALL {
        let w = decode_corner(reading.get(corner), cal.get(corner)).inspect_err(|e| {
            tracing::debug!(corner = corner.name(), error = %e, "corner decode failed");
        })?;
        total += w;
    }
    if total.is_finite() {
        Ok(total)
    } else {
        Err(DecodeError::NonFinite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const CAL: CornerCalibration = CornerCalibration::new(0, 100, 200);

    #[rstest]
    #[case(0, 0.0)]
    #[case(50, 8.5)]
    #[case(100, 17.0)]
    #[case(150, 25.5)]
    #[case(200, 34.0)]
    #[case(-100, -17.0)]
    #[case(300, 51.0)]
    fn corner_points(#[case] raw: i32, #[case] kg: f64) {
        let w = decode_corner(raw, &CAL).expect("decodes");
        assert!((w - kg).abs() < 1e-9, "raw {raw}: {w} != {kg}");
    }

    #[test]
    fn uniform_mid_reading_totals_68() {
        let set = CalibrationSet::uniform(CAL);
        let total = decode_total(&RawReading::uniform(100), &set).expect("decodes");
        assert!((total - 68.0).abs() < 1e-9);
    }

    #[test]
    fn corners_use_their_own_triples() {
        let set = CalibrationSet::new([
            CornerCalibration::new(0, 100, 200),
            CornerCalibration::new(1000, 1100, 1200),
            CornerCalibration::new(0, 10, 20),
            CornerCalibration::new(-50, 50, 150),
        ]);
        let reading = RawReading::new(100, 1000, 20, 50);
        let total = decode_total(&reading, &set).expect("decodes");
        assert!((total - (17.0 + 0.0 + 34.0 + 17.0)).abs() < 1e-9);
    }

    #[test]
    fn zero_lower_span_is_reported() {
        let cal = CornerCalibration::new(100, 100, 200);
        assert_eq!(
            decode_corner(50, &cal),
            Err(DecodeError::DegenerateSpan {
                lower: 100,
                upper: 100
            })
        );
        // Upper segment is still well defined.
        assert!(decode_corner(150, &cal).is_ok());
    }

    #[test]
    fn zero_upper_span_is_reported() {
        let cal = CornerCalibration::new(0, 100, 100);
        assert!(matches!(
            decode_corner(100, &cal),
            Err(DecodeError::DegenerateSpan { .. })
        ));
    }

    #[test]
    fn inverted_span_is_reported() {
        let cal = CornerCalibration::new(0, 200, 100);
        assert!(decode_corner(250, &cal).is_err());
    }

    #[test]
    fn total_fails_if_any_corner_fails() {
        let set = CalibrationSet::new([CAL, CAL, CAL, CornerCalibration::new(0, 0, 0)]);
        assert!(decode_total(&RawReading::uniform(100), &set).is_err());
    }

    #[test]
    fn extreme_raw_values_stay_finite() {
        let cal = CornerCalibration::new(i32::MIN, 0, i32::MAX);
        assert!(decode_corner(i32::MAX, &cal).is_ok());
        assert!(decode_corner(i32::MIN, &cal).is_ok());
    }
}
