use board_core::calibration::CornerCalibration;
use board_core::decoder::decode_corner;
use board_core::mac::{self, DeviceId};
use proptest::prelude::*;

prop_compose! {
    // Strictly increasing triple with room on both sides.
    fn ordered_triple()(
        low in -1_000_000i32..1_000_000,
        d1 in 1i32..100_000,
        d2 in 1i32..100_000,
    ) -> CornerCalibration {
        CornerCalibration::new(low, low + d1, low + d1 + d2)
    }
}

proptest! {
    #[test]
    fn continuous_at_mid(cal in ordered_triple()) {
        let at_mid = decode_corner(cal.mid, &cal).expect("decodes");
        prop_assert!((at_mid - 17.0).abs() < 1e-9);
        // Approaching from below lands within one count's worth of weight.
        let below = decode_corner(cal.mid - 1, &cal).expect("decodes");
        let step = 17.0 / f64::from(cal.mid - cal.low);
        prop_assert!((at_mid - below - step).abs() < 1e-6);
    }

    #[test]
    fn monotone_non_decreasing(
        cal in ordered_triple(),
        a in -3_000_000i32..3_000_000,
        b in -3_000_000i32..3_000_000,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let w_lo = decode_corner(lo, &cal).expect("decodes");
        let w_hi = decode_corner(hi, &cal).expect("decodes");
        prop_assert!(w_lo <= w_hi, "{lo} -> {w_lo}, {hi} -> {w_hi}");
    }

    #[test]
    fn never_returns_non_finite(
        low in any::<i32>(),
        mid in any::<i32>(),
        high in any::<i32>(),
        raw in any::<i32>(),
    ) {
        if let Ok(w) = decode_corner(raw, &CornerCalibration::new(low, mid, high)) {
            prop_assert!(w.is_finite());
        }
    }

    #[test]
    fn mac_rendering_is_contained_in_input(bytes in proptest::array::uniform6(any::<u8>())) {
        let text = bytes
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(":");
        let id = mac::encode(Some(&text));
        let cleaned = text.replace(':', "").to_ascii_lowercase();
        if bytes.iter().all(|&b| b == 0) {
            prop_assert_eq!(id, DeviceId::NONE);
        } else {
            let hex = format!("{:x}", id.0);
            prop_assert!(cleaned.contains(&hex));
            prop_assert_eq!(mac::to_mac_string(id), text);
        }
    }

    #[test]
    fn mac_encode_never_panics(s in ".{0,40}") {
        let _ = mac::encode(Some(&s));
    }
}
