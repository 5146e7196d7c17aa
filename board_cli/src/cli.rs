//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "board", version, about = "Balance board session CLI")]
pub struct Cli {
    /// Path to config TOML (typed); defaults apply when the file is absent
    #[arg(long, value_name = "FILE", default_value = "etc/board_config.toml")]
    pub config: PathBuf,

    /// Optional calibration CSV for the simulated board (strict header)
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Print samples and logs as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect and sample the board until Ctrl-C, a sample budget, or low battery
    Weigh {
        /// Sampling interval in ms (overrides config)
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
        /// Stop after this many samples
        #[arg(long, value_name = "N")]
        samples: Option<u64>,
        /// Append valid samples to <DIR>/<MAC>.tsv (overrides config)
        #[arg(long, value_name = "DIR")]
        record_dir: Option<PathBuf>,
        /// Display weights in pounds
        #[arg(long, action = ArgAction::SetTrue)]
        lbs: bool,
        /// Connect, fetch calibration and start streaming as separate steps
        #[arg(long, action = ArgAction::SetTrue)]
        stepwise: bool,
    },
    /// Connect once, print board details and calibration, disconnect
    SelfCheck,
    /// Print the device id encoded from a Bluetooth address
    DeviceId {
        /// Address such as 00:1B:7A:4C:2D:9E
        mac: String,
    },
}
