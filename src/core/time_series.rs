//! TimeSeries data structure: ordered samples with timeslot lookup,
//! resampling and energy integration.

use super::{Timeslot, SECONDS_PER_DAY};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use tracing::debug;

/// Samples whose own weight and whose successor's weight are both at or
/// below this value are considered flat and merged away by [`TimeSeries::resize`].
const MERGE_THRESHOLD: f64 = 0.001;

/// Semantics of the values stored in a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueMode {
    /// Each sample holds the energy accumulated since the previous sample.
    Energy,
    /// Each sample holds the power rate in effect up to its timeslot.
    #[default]
    Power,
}

/// A single observation.
///
/// The weight measures how much the series changed to reach this sample:
/// `ln(1 + |v_i - v_{i-1}| * (t_i - t_{i-1}))`. It is derived when the sample
/// is appended and is 0 for the first sample and for synthesized lookups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    value: f64,
    timeslot: Timeslot,
    weight: f64,
}

impl Sample {
    /// A synthesized sample with zero weight.
    pub fn new(value: f64, timeslot: Timeslot) -> Self {
        Self {
            value,
            timeslot,
            weight: 0.0,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn timeslot(&self) -> Timeslot {
        self.timeslot
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

fn change_weight(value: f64, previous: &Sample, span: Timeslot) -> f64 {
    (1.0 + (value - previous.value).abs() * span as f64).ln()
}

/// An ordered sequence of samples with non-decreasing timeslots.
///
/// # Example
/// ```
/// use harvest_forecast::core::{TimeSeries, ValueMode};
///
/// let series = TimeSeries::from_values("day", ValueMode::Power, 10, &[10.0, 12.0, 14.0]).unwrap();
/// assert_eq!(series.len(), 3);
/// // Power samples are held forward until the next stored sample.
/// assert_eq!(series.value_at(15).value(), 12.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    label: String,
    date: Option<NaiveDate>,
    mode: ValueMode,
    samples: Vec<Sample>,
}

impl TimeSeries {
    /// Create an empty series.
    pub fn new(label: impl Into<String>, mode: ValueMode) -> Self {
        Self {
            label: label.into(),
            date: None,
            mode,
            samples: Vec::new(),
        }
    }

    /// Set the collection date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Build a series from consecutive values at timeslots `step, 2*step, ...`.
    pub fn from_values(
        label: impl Into<String>,
        mode: ValueMode,
        step: Timeslot,
        values: &[f64],
    ) -> Result<Self> {
        if step <= 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "timeslot step must be positive, got {step}"
            )));
        }
        let mut series = Self::new(label, mode);
        series.samples.reserve(values.len());
        for (i, &value) in values.iter().enumerate() {
            series.append(value, step * (i as Timeslot + 1))?;
        }
        Ok(series)
    }

    /// An empty series sharing this series' value mode.
    pub(crate) fn derived(&self, label: impl Into<String>) -> Self {
        Self::new(label, self.mode)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn mode(&self) -> ValueMode {
        self.mode
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at a position, if any.
    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Sample at a position, failing when out of range.
    pub fn sample(&self, index: usize) -> Result<&Sample> {
        self.samples
            .get(index)
            .ok_or(ForecastError::IndexOutOfBounds {
                index,
                size: self.samples.len(),
            })
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Timeslot of the last sample.
    pub fn last_timeslot(&self) -> Option<Timeslot> {
        self.samples.last().map(|s| s.timeslot)
    }

    /// Stored values in order.
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Append a sample, deriving its weight from the current last sample.
    ///
    /// Fails if `timeslot` precedes the last stored timeslot.
    pub fn append(&mut self, value: f64, timeslot: Timeslot) -> Result<()> {
        let weight = match self.samples.last() {
            Some(last) if timeslot < last.timeslot => {
                return Err(ForecastError::TimeslotOrder {
                    previous: last.timeslot,
                    got: timeslot,
                });
            }
            Some(last) => change_weight(value, last, timeslot - last.timeslot),
            None => 0.0,
        };
        self.samples.push(Sample {
            value,
            timeslot,
            weight,
        });
        Ok(())
    }

    /// Index of the sample at or immediately before `timeslot`.
    ///
    /// An exact match returns the first sample with that timeslot. Queries
    /// before the first sample clamp to 0 and queries past the last sample
    /// clamp to the last index. `None` only for an empty series.
    pub fn index_at_or_before(&self, timeslot: Timeslot) -> Option<usize> {
        if self.samples.is_empty() {
            return None;
        }
        let pos = self.samples.partition_point(|s| s.timeslot < timeslot);
        let index = match self.samples.get(pos) {
            Some(s) if s.timeslot == timeslot => pos,
            _ if pos == 0 => 0,
            _ => pos - 1,
        };
        Some(index)
    }

    /// Value of the series at an arbitrary timeslot.
    ///
    /// Stored samples are returned as they are. Between samples, energy
    /// series return the pro-rated share of the next sample's energy and
    /// power series hold the next sample's rate. Synthesized samples have
    /// zero weight; an empty series yields a zero sample.
    pub fn value_at(&self, timeslot: Timeslot) -> Sample {
        let Some(index) = self.index_at_or_before(timeslot) else {
            return Sample::new(0.0, timeslot);
        };
        let sample = self.samples[index];
        let Some(next) = self.samples.get(index + 1) else {
            return sample;
        };
        if sample.timeslot == timeslot {
            return sample;
        }
        let value = match self.mode {
            ValueMode::Energy if next.timeslot != sample.timeslot => {
                next.value * (timeslot - sample.timeslot) as f64
                    / (next.timeslot - sample.timeslot) as f64
            }
            _ => next.value,
        };
        Sample::new(value, timeslot)
    }

    /// Resample in place, collapsing flat stretches and splitting
    /// high-variation ones.
    ///
    /// Interior samples are dropped while both their own weight and the next
    /// sample's weight stay at or below 0.001. The dropped count is then
    /// handed back to the retained samples in proportion to their weights:
    /// a sample of weight `w` is split into `floor(removed * w / sum) + 1`
    /// equally spaced sub-samples. The first and last samples keep their
    /// timeslots. Call this once, before the series is shared.
    pub fn resize(&mut self) {
        let size = self.samples.len();
        if size < 3 {
            return;
        }

        let mut merged = Vec::with_capacity(size);
        merged.push(self.samples[0]);
        for i in 1..size - 1 {
            let sample = self.samples[i];
            if sample.weight <= MERGE_THRESHOLD && self.samples[i + 1].weight <= MERGE_THRESHOLD {
                continue;
            }
            if merged.len() == 1 && i > 1 {
                merged.push(self.samples[i - 1]);
            }
            merged.push(sample);
        }
        merged.push(self.samples[size - 1]);

        let merged_size = merged.len();
        if merged_size >= size {
            return;
        }

        let removed = (size - merged_size) as f64;
        let sum_weight: f64 = merged[1..].iter().map(|s| s.weight).sum();
        let mut resized = Vec::with_capacity(size);
        resized.push(merged[0]);
        for pair in merged.windows(2) {
            let (previous, sample) = (pair[0], pair[1]);
            let subslots = if sum_weight > 0.0 {
                (removed * (sample.weight / sum_weight)).floor() as Timeslot + 1
            } else {
                1
            };
            if subslots <= 1 {
                resized.push(sample);
                continue;
            }

            let value = match self.mode {
                ValueMode::Energy => sample.value / subslots as f64,
                ValueMode::Power => sample.value,
            };
            let sub_step = (sample.timeslot - previous.timeslot) / subslots;
            for j in 1..=subslots {
                let timeslot = if j == subslots {
                    sample.timeslot
                } else {
                    previous.timeslot + j * sub_step
                };
                let weight = if j == 1 {
                    change_weight(value, &previous, sub_step)
                } else {
                    0.0
                };
                resized.push(Sample {
                    value,
                    timeslot,
                    weight,
                });
            }
        }

        debug!(
            label = %self.label,
            original = size,
            merged = merged_size,
            resized = resized.len(),
            "resized series"
        );
        self.samples = resized;
    }

    /// Sample with the greatest value; the first one wins ties.
    pub fn max_sample(&self) -> Option<&Sample> {
        let mut best: Option<&Sample> = None;
        for sample in &self.samples {
            if best.map_or(true, |b| sample.value > b.value) {
                best = Some(sample);
            }
        }
        best
    }

    /// Energy harvested between two timeslots.
    ///
    /// Every crossed interval contributes its sample value (energy mode) or
    /// value times duration (power mode). Partial intervals at either end are
    /// pro-rated and the sum is scaled by `power_factor`. Integration stops
    /// at the last sample. Returns 0 when `to <= from`.
    ///
    /// # Example
    /// ```
    /// use harvest_forecast::core::{TimeSeries, ValueMode};
    ///
    /// let series = TimeSeries::from_values("day", ValueMode::Power, 10, &[1.0, 2.0, 3.0]).unwrap();
    /// // 2.0 over (10, 20] and 3.0 over (20, 25]
    /// assert_eq!(series.energy_harvested(10, 25, 1.0), 35.0);
    /// ```
    pub fn energy_harvested(&self, from: Timeslot, to: Timeslot, power_factor: f64) -> f64 {
        if to <= from {
            return 0.0;
        }
        let Some(mut index) = self.index_at_or_before(from) else {
            return 0.0;
        };

        let mut prev_timeslot = self.samples[index].timeslot;
        let mut energy = 0.0;
        while prev_timeslot < to {
            let Some(current) = self.samples.get(index + 1) else {
                break;
            };
            let span = (current.timeslot - prev_timeslot) as f64;
            let share = |slots: Timeslot| match self.mode {
                ValueMode::Energy => current.value * slots as f64 / span,
                ValueMode::Power => current.value * slots as f64,
            };

            if prev_timeslot < from {
                energy -= share(from - prev_timeslot);
            }
            energy += match self.mode {
                ValueMode::Energy => current.value,
                ValueMode::Power => current.value * span,
            };
            if current.timeslot > to {
                energy -= share(current.timeslot - to);
            }

            prev_timeslot = current.timeslot;
            index += 1;
        }
        energy * power_factor
    }

    /// Factor turning integrated power over the trace into a full-day amount.
    ///
    /// 1.0 for energy series, `86400 / last_timeslot` for power series.
    pub fn day_power_factor(&self) -> f64 {
        match (self.mode, self.last_timeslot()) {
            (ValueMode::Power, Some(last)) if last > 0 => SECONDS_PER_DAY as f64 / last as f64,
            _ => 1.0,
        }
    }

    /// Energy harvested over the whole series.
    pub fn total_energy_harvested(&self) -> f64 {
        match self.last_timeslot() {
            Some(last) => self.energy_harvested(0, last, self.day_power_factor()),
            None => 0.0,
        }
    }
}
