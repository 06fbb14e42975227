//! Loading traces from flat files: one decimal value per line.

use super::{TimeSeries, Timeslot, ValueMode};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// Reads trace files into [`TimeSeries`].
///
/// Successive values land on timeslots `step, 2*step, ...`. The collection
/// date is parsed from the file name with `date_format`.
///
/// # Example
/// ```
/// use harvest_forecast::core::{TraceLoader, ValueMode};
///
/// let loader = TraceLoader::new(300).unwrap().with_mode(ValueMode::Energy);
/// let series = loader.read("1.5\n2.0\n\n0.5\n".as_bytes(), "inline").unwrap();
/// assert_eq!(series.len(), 3);
/// assert_eq!(series.last_timeslot(), Some(900));
/// ```
#[derive(Debug, Clone)]
pub struct TraceLoader {
    step: Timeslot,
    mode: ValueMode,
    date_format: String,
}

impl Default for TraceLoader {
    fn default() -> Self {
        Self {
            step: 1,
            mode: ValueMode::Power,
            date_format: "%Y%m%d.trace".to_string(),
        }
    }
}

impl TraceLoader {
    /// Create a loader with the given timeslot step.
    pub fn new(step: Timeslot) -> Result<Self> {
        if step <= 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "timeslot step must be positive, got {step}"
            )));
        }
        Ok(Self {
            step,
            ..Self::default()
        })
    }

    /// Set the value semantics of loaded series.
    pub fn with_mode(mut self, mode: ValueMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the `chrono` format used to read dates from file names.
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }

    pub fn step(&self) -> Timeslot {
        self.step
    }

    pub fn mode(&self) -> ValueMode {
        self.mode
    }

    /// Collection date encoded in a file name, if it matches the format.
    pub fn parse_date(&self, file_name: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(file_name, &self.date_format).ok()
    }

    /// Read a trace from any buffered reader.
    pub fn read<R: BufRead>(&self, reader: R, label: &str) -> Result<TimeSeries> {
        let mut series = TimeSeries::new(label, self.mode);
        let mut timeslot = self.step;
        for (number, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| ForecastError::Io {
                path: label.to_string(),
                message: e.to_string(),
            })?;
            let content = line.trim();
            if content.is_empty() {
                continue;
            }
            let value: f64 = content.parse().map_err(|_| ForecastError::Parse {
                line: number + 1,
                content: content.to_string(),
            })?;
            series.append(value, timeslot)?;
            timeslot += self.step;
        }
        if series.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        Ok(series)
    }

    /// Load one trace file. The label is the file name.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<TimeSeries> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ForecastError::io(path, &e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let series = self.read(BufReader::new(file), &name)?;
        let series = match self.parse_date(&name) {
            Some(date) => series.with_date(date),
            None => {
                debug!(file = %name, format = %self.date_format, "no collection date in file name");
                series
            }
        };
        debug!(file = %name, samples = series.len(), "loaded trace");
        Ok(series)
    }

    /// Load every trace in `dir` whose name ends with `extension`, sorted by name.
    ///
    /// When `max_previous_days > 0` and a reference date is given, only traces
    /// collected 1 to `max_previous_days` days before it are kept.
    pub fn load_pool(
        &self,
        dir: impl AsRef<Path>,
        extension: &str,
        reference_date: Option<NaiveDate>,
        max_previous_days: u32,
    ) -> Result<Vec<TimeSeries>> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| ForecastError::io(dir, &e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ForecastError::io(dir, &e))?.path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(extension));
            if matches && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut pool = Vec::with_capacity(paths.len());
        for path in paths {
            if let (Some(reference), true) = (reference_date, max_previous_days > 0) {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                let Some(date) = self.parse_date(name) else {
                    warn!(file = %name, "skipping trace without a collection date");
                    continue;
                };
                let days = (reference - date).num_days();
                if days <= 0 || days > i64::from(max_previous_days) {
                    continue;
                }
            }
            pool.push(self.load_file(&path)?);
        }
        debug!(dir = %dir.display(), traces = pool.len(), "loaded trace pool");
        Ok(pool)
    }
}
