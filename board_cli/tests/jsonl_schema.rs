use assert_cmd::prelude::*;
use serde_json::Value;
use std::process::Command;
use tempfile::{TempDir, tempdir};

fn board(dir: &TempDir) -> Command {
    let cfg = dir.path().join("cfg.toml");
    std::fs::write(&cfg, "[sampling]\ninterval_ms = 5\n").unwrap();
    let mut cmd = Command::cargo_bin("board").unwrap();
    cmd.arg("--json").arg("--config").arg(cfg);
    for var in ["BOARD_SIM_WEIGHT_KG", "BOARD_SIM_CONNECT_CODE", "BOARD_SIM_DRAIN_AFTER"] {
        cmd.env_remove(var);
    }
    cmd
}

fn json_lines(bytes: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(bytes)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("each stdout line is JSON"))
        .collect()
}

#[test]
fn weigh_emits_one_object_per_sample_and_a_summary() {
    let dir = tempdir().unwrap();
    let out = board(&dir)
        .env("BOARD_SIM_WEIGHT_KG", "68")
        .args(["weigh", "--samples", "3"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let lines = json_lines(&out.stdout);
    assert_eq!(lines.len(), 4);
    for (i, v) in lines[..3].iter().enumerate() {
        assert_eq!(v["seq"].as_u64(), Some(i as u64));
        assert_eq!(v["device_id"].as_u64(), Some(117_811_842_462));
        assert_eq!(v["unit"], "kg");
        assert_eq!(v["validity"], "valid");
        assert_eq!(v["weight"].as_f64(), Some(68.0));
        assert!(v["timestamp"].is_string());
    }
    let summary = &lines[3]["summary"];
    assert_eq!(summary["valid"].as_u64(), Some(3));
    assert_eq!(summary["ended_by"], "SampleBudget");
}

#[test]
fn errors_are_json_on_stderr() {
    let dir = tempdir().unwrap();
    let out = board(&dir)
        .env("BOARD_SIM_CONNECT_CODE", "-7")
        .arg("self-check")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));

    let err = String::from_utf8_lossy(&out.stderr);
    let last = err.lines().last().expect("error line");
    let v: Value = serde_json::from_str(last).unwrap();
    assert_eq!(v["reason"], "BoardError");
    assert_eq!(v["category"], "battery");
    assert_eq!(v["code"].as_i64(), Some(-7));
}

#[test]
fn device_id_json() {
    let dir = tempdir().unwrap();
    let out = board(&dir)
        .args(["device-id", "00:1B:7A:4C:2D:9E"])
        .output()
        .unwrap();
    let v: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["device_id"].as_u64(), Some(117_811_842_462));
    assert_eq!(v["available"], true);
}
