//! End-to-end runs against the simulated board.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use board_core::runner::{self, EndReason, RunOptions};
use board_core::{Session, SessionState, TsvRecorder, Validity};
use board_hardware::{DEFAULT_CALIBRATION, SimulatedBoard};
use rstest::rstest;

fn session(board: SimulatedBoard) -> Session<SimulatedBoard> {
    Session::builder()
        .with_driver(board)
        .with_interval(Duration::from_millis(5))
        .build()
        .expect("build")
}

#[rstest]
#[case(false)]
#[case(true)]
fn weighs_and_records(#[case] stepwise: bool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let board = SimulatedBoard::new(DEFAULT_CALIBRATION)
        .expect("board")
        .with_weight_kg(68.0);
    let mut s = session(board);
    let mut rec = TsvRecorder::new(dir.path());
    let stop = AtomicBool::new(false);
    let mut seen = Vec::new();

    let summary = runner::run(
        &mut s,
        RunOptions {
            max_samples: Some(4),
            stepwise,
        },
        &stop,
        Some(&mut rec),
        |sample| seen.push(sample.clone()),
    )
    .expect("run");

    assert_eq!(summary.ended_by, EndReason::SampleBudget);
    assert_eq!(summary.valid, 4);
    assert_eq!(summary.recorded, 4);
    assert_eq!(summary.last_valid_kg, Some(68.0));
    assert_eq!(s.state(), SessionState::Disconnected);
    assert_eq!(seen.len(), 4);
    assert!(seen.iter().all(|x| x.device_id == summary.device_id));

    let text = std::fs::read_to_string(dir.path().join("001B7A4C2D9E.tsv")).expect("record file");
    assert_eq!(text.lines().count(), 4);
    assert!(text.lines().all(|l| l.ends_with("\t68")));
}

#[test]
fn drained_battery_ends_the_session() {
    let board = SimulatedBoard::new(DEFAULT_CALIBRATION)
        .expect("board")
        .with_weight_kg(70.0)
        .with_drain_after(3);
    let mut s = session(board);
    let stop = AtomicBool::new(false);
    let mut validities = Vec::new();

    let summary = runner::run(&mut s, RunOptions::default(), &stop, None, |sample| {
        validities.push(sample.validity);
    })
    .expect("run");

    assert_eq!(summary.ended_by, EndReason::LowBattery);
    assert_eq!(
        validities,
        vec![
            Validity::Valid,
            Validity::Valid,
            Validity::Valid,
            Validity::LowBattery
        ]
    );
    assert_eq!(s.state(), SessionState::Disconnected);
    s.with_driver(|d| assert!(!d.is_connected()));
}

#[test]
fn battery_code_on_connect_is_reported() {
    let board = SimulatedBoard::new(DEFAULT_CALIBRATION)
        .expect("board")
        .with_connect_code(-7);
    let mut s = session(board);
    let stop = AtomicBool::new(false);
    let err = runner::run(&mut s, RunOptions::default(), &stop, None, |_| {})
        .expect_err("battery");
    let be = err
        .downcast_ref::<board_core::BoardError>()
        .expect("typed error");
    assert_eq!(be.category(), Some(board_core::ErrorCategory::Battery));
    assert_eq!(s.state(), SessionState::Disconnected);
}
