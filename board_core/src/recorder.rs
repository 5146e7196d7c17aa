//! Persistence of valid samples, one tab-separated line each.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use eyre::WrapErr;

use crate::error::Result;
use crate::mac::{self, DeviceId};
use crate::sample::Sample;

pub trait SampleRecorder {
    /// Persist `sample` if it qualifies. Returns whether a line was written.
    fn record(&mut self, sample: &Sample) -> Result<bool>;
}

/// Appends to `<dir>/<MAC without colons>.tsv`, one file per device.
#[derive(Debug, Clone)]
pub struct TsvRecorder {
    dir: PathBuf,
}

impl TsvRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: DeviceId) -> PathBuf {
        let name = mac::to_mac_string(id).replace(':', "");
        self.dir.join(format!("{name}.tsv"))
    }
}

impl SampleRecorder for TsvRecorder {
    fn record(&mut self, sample: &Sample) -> Result<bool> {
        if !sample.is_valid() || !sample.device_id.is_available() {
            return Ok(false);
        }
        let Some(line) = sample.record_line() else {
            return Ok(false);
        };
        std::fs::create_dir_all(&self.dir)
            .wrap_err_with(|| format!("create record dir {}", self.dir.display()))?;
        let path = self.path_for(sample.device_id);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .wrap_err_with(|| format!("open record file {}", path.display()))?;
        writeln!(file, "{line}").wrap_err("append sample record")?;
        Ok(true)
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    pub lines: Vec<String>,
}

impl SampleRecorder for MemoryRecorder {
    fn record(&mut self, sample: &Sample) -> Result<bool> {
        if !sample.is_valid() || !sample.device_id.is_available() {
            return Ok(false);
        }
        match sample.record_line() {
            Some(line) => {
                self.lines.push(line);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
