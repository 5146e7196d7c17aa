#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and calibration-table parsing for the board tools.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The calibration CSV loader enforces headers and requires exactly one
//!   row per corner. Triples are taken verbatim; ordering of low/mid/high is
//!   the decoder's problem, not the loader's.
use board_traits::Corner;
use serde::Deserialize;

/// Calibration CSV schema.
///
/// Expected headers:
/// corner,low,mid,high
///
/// Example:
/// corner,low,mid,high
/// top_left,1520,3280,5060
#[derive(Debug, Deserialize, Clone)]
pub struct CalibrationRow {
    pub corner: String,
    pub low: i32,
    pub mid: i32,
    pub high: i32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Board {
    /// Bluetooth scan window handed to the driver, in seconds.
    pub scan_timeout_s: u32,
}

impl Default for Board {
    fn default() -> Self {
        Self { scan_timeout_s: 3 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sampling {
    /// Time between two sampling ticks.
    pub interval_ms: u64,
    /// A decoded total at or below this weight means the board's battery is
    /// failing; the session is ended.
    pub low_battery_threshold_kg: f64,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            interval_ms: 3000,
            low_battery_threshold_kg: -50.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Kg,
    Lbs,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Recording {
    /// Directory for per-device sample files; recording is off when absent.
    pub dir: Option<String>,
    /// Display unit for printed weights. Records are always kilograms.
    pub unit: Unit,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub board: Board,
    #[serde(default)]
    pub sampling: Sampling,
    #[serde(default)]
    pub recording: Recording,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Board
        if self.board.scan_timeout_s == 0 {
            eyre::bail!("board.scan_timeout_s must be >= 1");
        }
        if self.board.scan_timeout_s > 60 {
            eyre::bail!("board.scan_timeout_s is unreasonably large (>60s)");
        }

        // Sampling
        if self.sampling.interval_ms == 0 {
            eyre::bail!("sampling.interval_ms must be >= 1");
        }
        if self.sampling.interval_ms > 60 * 60 * 1000 {
            eyre::bail!("sampling.interval_ms is unreasonably large (>1h)");
        }
        if !self.sampling.low_battery_threshold_kg.is_finite() {
            eyre::bail!("sampling.low_battery_threshold_kg must be finite");
        }
        if self.sampling.low_battery_threshold_kg > 0.0 {
            eyre::bail!("sampling.low_battery_threshold_kg must be <= 0.0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        Ok(())
    }
}

/// Calibration triples for all four corners, in `Corner::ALL` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationTable {
    pub triples: [[i32; 3]; 4],
}

impl CalibrationTable {
    pub fn get(&self, corner: Corner) -> [i32; 3] {
        self.triples[corner.index()]
    }

    /// Build a table from rows, requiring every corner exactly once.
    pub fn from_rows(rows: Vec<CalibrationRow>) -> eyre::Result<Self> {
        let mut seen: [Option<[i32; 3]>; 4] = [None; 4];
        for (idx, row) in rows.iter().enumerate() {
            let corner = Corner::from_name(row.corner.trim()).ok_or_else(|| {
                eyre::eyre!("unknown corner {:?} in calibration row {}", row.corner, idx)
            })?;
            let slot = &mut seen[corner.index()];
            if slot.is_some() {
                eyre::bail!(
                    "calibration rows have duplicate corner {} at row {}",
                    corner.name(),
                    idx
                );
            }
            *slot = Some([row.low, row.mid, row.high]);
        }

        let mut triples = [[0i32; 3]; 4];
        for corner in Corner::ALL {
            triples[corner.index()] = seen[corner.index()]
                .ok_or_else(|| eyre::eyre!("calibration is missing corner {}", corner.name()))?;
        }
        Ok(Self { triples })
    }
}

impl TryFrom<Vec<CalibrationRow>> for CalibrationTable {
    type Error = eyre::Report;
    fn try_from(rows: Vec<CalibrationRow>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

pub fn load_calibration_csv(path: &std::path::Path) -> eyre::Result<CalibrationTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["corner", "low", "mid", "high"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers 'corner,low,mid,high', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<CalibrationRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    CalibrationTable::try_from(rows)
}
