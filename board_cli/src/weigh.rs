//! Session assembly and the `weigh` / `self-check` commands.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use board_config::{CalibrationTable, Config};
use board_core::error::Result as CoreResult;
use board_core::runner::{self, RunOptions, RunSummary};
use board_core::{Sample, SampleRecorder, SamplingCfg, Session, TsvRecorder, WeightUnit, mac};
use board_hardware::{DEFAULT_CALIBRATION, SimulatedBoard};
use board_traits::Corner;
use eyre::WrapErr;
use serde_json::json;

/// Knobs for the simulated board, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct SimSettings {
    pub weight_kg: f64,
    pub connect_code: Option<i32>,
    pub drain_after: Option<u64>,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            weight_kg: 70.0,
            connect_code: None,
            drain_after: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> eyre::Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .wrap_err_with(|| format!("invalid {name}={v:?}")),
        Err(_) => Ok(None),
    }
}

impl SimSettings {
    /// `BOARD_SIM_WEIGHT_KG`, `BOARD_SIM_CONNECT_CODE`, `BOARD_SIM_DRAIN_AFTER`.
    pub fn from_env() -> eyre::Result<Self> {
        let mut s = Self::default();
        if let Some(kg) = env_parse::<f64>("BOARD_SIM_WEIGHT_KG")? {
            s.weight_kg = kg;
        }
        s.connect_code = env_parse("BOARD_SIM_CONNECT_CODE")?;
        s.drain_after = env_parse("BOARD_SIM_DRAIN_AFTER")?;
        Ok(s)
    }
}

pub fn make_board(
    table: Option<&CalibrationTable>,
    sim: &SimSettings,
) -> eyre::Result<SimulatedBoard> {
    let triples = table.map_or(DEFAULT_CALIBRATION, |t| t.triples);
    let mut board = SimulatedBoard::new(triples)
        .wrap_err("calibration table does not fit the board's registers")?
        .with_weight_kg(sim.weight_kg);
    if let Some(code) = sim.connect_code {
        board = board.with_connect_code(code);
    }
    if let Some(n) = sim.drain_after {
        board = board.with_drain_after(n);
    }
    Ok(board)
}

pub fn build_session(
    cfg: &Config,
    board: SimulatedBoard,
    interval_ms_override: Option<u64>,
) -> CoreResult<Session<SimulatedBoard>> {
    // Config mapping goes through the From impls in board_core::conversions
    let mut sampling: SamplingCfg = (&cfg.sampling).into();
    if let Some(ms) = interval_ms_override {
        sampling.interval = Duration::from_millis(ms);
    }
    Session::builder()
        .with_driver(board)
        .with_sampling(sampling)
        .with_scan_timeout_s(cfg.board.scan_timeout_s)
        .build()
}

#[derive(Debug, Clone, Default)]
pub struct WeighArgs {
    pub samples: Option<u64>,
    pub record_dir: Option<PathBuf>,
    pub lbs: bool,
    pub stepwise: bool,
}

fn print_sample(sample: &Sample, unit: WeightUnit, json: bool) {
    let weight = sample.weight_in(unit);
    if json {
        let line = json!({
            "seq": sample.seq,
            "timestamp": sample.timestamp,
            "device_id": sample.device_id,
            "weight": weight,
            "unit": unit.suffix(),
            "validity": sample.validity,
        });
        println!("{line}");
    } else {
        match weight {
            Some(w) => println!(
                "#{:<4} {:>8.2} {} {:?}",
                sample.seq,
                w,
                unit.suffix(),
                sample.validity
            ),
            None => println!("#{:<4} {:>8} {} {:?}", sample.seq, "--", unit.suffix(), sample.validity),
        }
    }
}

fn print_summary(summary: &RunSummary, unit: WeightUnit, json: bool) {
    let last = summary.last_valid_kg.map(|kg| unit.from_kg(kg));
    if json {
        let line = json!({
            "summary": {
                "device_id": summary.device_id,
                "valid": summary.valid,
                "invalid": summary.invalid,
                "low_battery": summary.low_battery,
                "recorded": summary.recorded,
                "last_weight": last,
                "unit": unit.suffix(),
                "ended_by": format!("{:?}", summary.ended_by),
            }
        });
        println!("{line}");
    } else {
        println!(
            "session ended ({:?}): {} valid, {} invalid, {} low-battery, {} recorded",
            summary.ended_by, summary.valid, summary.invalid, summary.low_battery, summary.recorded
        );
        if let Some(w) = last {
            println!("last weight: {w:.2} {}", unit.suffix());
        }
    }
}

/// Run one weighing session until shutdown, sample budget or low battery.
pub fn run_weigh(
    cfg: &Config,
    mut session: Session<SimulatedBoard>,
    args: &WeighArgs,
    shutdown: &AtomicBool,
    json: bool,
) -> CoreResult<RunSummary> {
    let unit = if args.lbs {
        WeightUnit::Lbs
    } else {
        WeightUnit::from(cfg.recording.unit)
    };
    let record_dir = args
        .record_dir
        .clone()
        .or_else(|| cfg.recording.dir.as_ref().map(PathBuf::from));
    let mut recorder = record_dir.map(TsvRecorder::new);
    if let Some(r) = &recorder {
        tracing::info!(dir = %r.dir().display(), "recording valid samples");
    }

    let summary = runner::run(
        &mut session,
        RunOptions {
            max_samples: args.samples,
            stepwise: args.stepwise,
        },
        shutdown,
        recorder.as_mut().map(|r| r as &mut dyn SampleRecorder),
        |s| print_sample(s, unit, json),
    )?;
    print_summary(&summary, unit, json);
    Ok(summary)
}

/// Connect once, report what the board says about itself, disconnect.
pub fn self_check(mut session: Session<SimulatedBoard>, json: bool) -> CoreResult<()> {
    let _stream = session.connect()?;
    let version = session.driver_version();
    let battery = session.battery_level();
    let id = session.device_id();
    let calibration = session.calibration();
    session.disconnect()?;

    let table: Vec<_> = Corner::ALL
        .iter()
        .map(|&c| {
            let t = calibration.as_ref().map(|set| *set.get(c));
            (c.name(), t.map(|t| [t.low, t.mid, t.high]))
        })
        .collect();

    if json {
        let corners: serde_json::Map<_, _> = table
            .iter()
            .map(|(name, t)| ((*name).to_string(), json!(t)))
            .collect();
        let line = json!({
            "driver": version,
            "battery": battery,
            "device_id": id,
            "mac": mac::to_mac_string(id),
            "calibration": corners,
            "ok": true,
        });
        println!("{line}");
    } else {
        println!("driver:    {version}");
        println!("battery:   {battery}%");
        println!("device id: {id} ({})", mac::to_mac_string(id));
        for (name, t) in &table {
            if let Some([low, mid, high]) = t {
                println!("  {name:<13} {low:>6} {mid:>6} {high:>6}");
            }
        }
        println!("OK");
    }
    Ok(())
}
