//! Sampling thread lifecycle and cleanup.
//!
//! Verifies that:
//! - The thread exits when the `SamplingLoop` is dropped
//! - Many loops can be created and destroyed without hanging
//! - The thread exits when the consumer disconnects, running its teardown
//! - A stop interrupts a long interval immediately

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use board_core::calibration::{CalibrationSet, CornerCalibration};
use board_core::mocks::FakeBoard;
use board_core::sampler::{SamplingLoop, StopToken};
use board_core::{DeviceId, SamplingCfg, Validity};
use board_traits::clock::MonotonicClock;

fn spawn(board: FakeBoard, interval: Duration) -> (SamplingLoop, board_core::SampleStream) {
    SamplingLoop::spawn(
        Arc::new(Mutex::new(board)),
        Arc::new(CalibrationSet::uniform(CornerCalibration::new(0, 100, 200))),
        DeviceId(1),
        SamplingCfg {
            interval,
            ..SamplingCfg::default()
        },
        StopToken::new(),
        Arc::new(MonotonicClock::new()),
        Box::new(|_: &mut FakeBoard| {}),
    )
}

#[test]
fn thread_exits_on_drop() {
    let (sampler, stream) = spawn(FakeBoard::new(), Duration::from_millis(10));
    let first = stream.recv_timeout(Duration::from_secs(5)).expect("sample");
    assert_eq!(first.validity, Validity::Valid);
    drop(sampler);
    // Joined on drop: the sender is gone once queued samples are drained.
    let _ = stream.drain();
    assert!(stream.recv().is_none());
}

#[test]
fn multiple_loops_dont_leak_threads() {
    for _ in 0..10 {
        let (sampler, stream) = spawn(FakeBoard::new(), Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(10));
        let _ = stream.try_recv();
        sampler.join();
    }
}

#[test]
fn loop_exits_when_consumer_disconnects() {
    let (sampler, stream) = spawn(FakeBoard::new(), Duration::from_millis(5));
    let _ = stream.recv_timeout(Duration::from_secs(5));
    drop(stream);

    let deadline = Instant::now() + Duration::from_secs(5);
    while !sampler.is_finished() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(sampler.is_finished());
}

#[test]
fn stop_interrupts_a_long_interval() {
    let (sampler, stream) = spawn(FakeBoard::new(), Duration::from_secs(600));
    let _ = stream.recv_timeout(Duration::from_secs(5)).expect("first tick");
    let start = Instant::now();
    sampler.join();
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn stopped_token_emits_nothing() {
    let token = StopToken::new();
    token.stop();
    let board = FakeBoard::new();
    let handle = board.handle();
    let (sampler, stream) = SamplingLoop::spawn(
        Arc::new(Mutex::new(board)),
        Arc::new(CalibrationSet::uniform(CornerCalibration::new(0, 100, 200))),
        DeviceId(1),
        SamplingCfg::default(),
        token,
        Arc::new(MonotonicClock::new()),
        Box::new(|_: &mut FakeBoard| {}),
    );
    sampler.join();
    assert!(stream.recv().is_none());
    assert_eq!(handle.validity_checks(), 0);
}

#[test]
fn low_battery_runs_the_hook_once() {
    let hits = Arc::new(Mutex::new(0u32));
    let h2 = Arc::clone(&hits);
    let (sampler, stream) = SamplingLoop::spawn(
        Arc::new(Mutex::new(FakeBoard::new().with_live([-1000; 4]))),
        Arc::new(CalibrationSet::uniform(CornerCalibration::new(0, 100, 200))),
        DeviceId(1),
        SamplingCfg {
            interval: Duration::from_millis(5),
            ..SamplingCfg::default()
        },
        StopToken::new(),
        Arc::new(MonotonicClock::new()),
        Box::new(move |drv: &mut FakeBoard| {
            let _ = board_traits::BoardDriver::disconnect(drv);
            *h2.lock().expect("lock") += 1;
        }),
    );
    let samples: Vec<_> = stream.into_iter().collect();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].validity, Validity::LowBattery);
    assert!(sampler.token().is_stopped());
    sampler.join();
    assert_eq!(*hits.lock().expect("lock"), 1);
}

fn counting_hook(hits: &Arc<Mutex<u32>>) -> board_core::sampler::TeardownHook<FakeBoard> {
    let hits = Arc::clone(hits);
    Box::new(move |_: &mut FakeBoard| *hits.lock().expect("lock") += 1)
}

#[test]
fn consumer_loss_runs_the_hook_once() {
    let hits = Arc::new(Mutex::new(0u32));
    let (sampler, stream) = SamplingLoop::spawn(
        Arc::new(Mutex::new(FakeBoard::new())),
        Arc::new(CalibrationSet::uniform(CornerCalibration::new(0, 100, 200))),
        DeviceId(1),
        SamplingCfg {
            interval: Duration::from_millis(5),
            ..SamplingCfg::default()
        },
        StopToken::new(),
        Arc::new(MonotonicClock::new()),
        counting_hook(&hits),
    );
    let _ = stream.recv_timeout(Duration::from_secs(5));
    drop(stream);

    let deadline = Instant::now() + Duration::from_secs(5);
    while !sampler.is_finished() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(sampler.token().is_stopped());
    sampler.join();
    assert_eq!(*hits.lock().expect("lock"), 1);
}

#[test]
fn explicit_stop_skips_the_hook() {
    let hits = Arc::new(Mutex::new(0u32));
    let (sampler, stream) = SamplingLoop::spawn(
        Arc::new(Mutex::new(FakeBoard::new())),
        Arc::new(CalibrationSet::uniform(CornerCalibration::new(0, 100, 200))),
        DeviceId(1),
        SamplingCfg {
            interval: Duration::from_millis(5),
            ..SamplingCfg::default()
        },
        StopToken::new(),
        Arc::new(MonotonicClock::new()),
        counting_hook(&hits),
    );
    let _ = stream.recv_timeout(Duration::from_secs(5));
    sampler.join();
    drop(stream);
    assert_eq!(*hits.lock().expect("lock"), 0);
}
