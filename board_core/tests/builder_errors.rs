use std::time::Duration;

use board_core::error::BuildError;
use board_core::mocks::FakeBoard;
use board_core::{SamplingCfg, Session, SessionState};
use rstest::rstest;

#[rstest]
fn builder_missing_driver_yields_typed_build_error() {
    let err = Session::<FakeBoard>::builder()
        // missing with_driver()
        .with_scan_timeout_s(3)
        .build()
        .expect_err("should fail with MissingDriver");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingDriver) => {}
        other => panic!("expected MissingDriver, got: {other:?}"),
    }
}

#[rstest]
#[case(SamplingCfg { interval: Duration::ZERO, ..SamplingCfg::default() })]
#[case(SamplingCfg { interval: Duration::from_secs(7200), ..SamplingCfg::default() })]
#[case(SamplingCfg { low_battery_threshold_kg: f64::NAN, ..SamplingCfg::default() })]
fn builder_rejects_bad_sampling(#[case] sampling: SamplingCfg) {
    let err = Session::builder()
        .with_driver(FakeBoard::new())
        .with_sampling(sampling)
        .build()
        .expect_err("invalid sampling");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}

#[test]
fn builder_rejects_zero_scan_timeout() {
    let err = Session::builder()
        .with_driver(FakeBoard::new())
        .with_scan_timeout_s(0)
        .build()
        .expect_err("zero scan timeout");
    assert!(err.to_string().contains("scan timeout"));
}

#[test]
fn defaults_are_applied() {
    let s = Session::builder()
        .with_driver(FakeBoard::new())
        .build()
        .expect("build");
    assert_eq!(*s.sampling_cfg(), SamplingCfg::default());
    assert_eq!(s.sampling_cfg().interval, Duration::from_millis(3000));
    assert_eq!(s.state(), SessionState::Disconnected);
    assert_eq!(s.driver_version(), "fake-board 1.0");
    assert_eq!(s.battery_level(), 100);
}
