//! IPro-Energy: Pro-Energy's blend plus a smoothing term from the latest trend.

use super::{check_unit_interval, Predictor};
use crate::core::{Sample, TimeSeries};
use crate::error::Result;

const SMOOTHING_FACTOR: f64 = 0.5;

/// `w * init + (1 - w) * past + smoothing`, where
/// `smoothing = 2 * s * prev * (init - prev) / (init + prev)` with `s = 0.5`
/// and `prev` the sample before the origin (0 when `init + prev == 0`).
#[derive(Debug, Clone)]
pub struct IproEnergyPredictor<'a> {
    current: &'a TimeSeries,
    reference: &'a TimeSeries,
    weight: f64,
}

impl<'a> IproEnergyPredictor<'a> {
    /// Create a predictor; `weight` must lie in [0, 1].
    pub fn new(current: &'a TimeSeries, reference: &'a TimeSeries, weight: f64) -> Result<Self> {
        check_unit_interval("weighting factor", weight)?;
        Ok(Self {
            current,
            reference,
            weight,
        })
    }

    fn smoothing(&self, init: &Sample) -> f64 {
        let init_value = init.value();
        // at the first sample the origin is its own predecessor
        let previous = self
            .current
            .index_at_or_before(init.timeslot())
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.current.get(i))
            .map_or(init_value, |s| s.value());
        let total = init_value + previous;
        if total == 0.0 {
            0.0
        } else {
            2.0 * SMOOTHING_FACTOR * previous * (init_value - previous) / total
        }
    }
}

impl Predictor for IproEnergyPredictor<'_> {
    fn current(&self) -> &TimeSeries {
        self.current
    }

    fn reference(&self) -> &TimeSeries {
        self.reference
    }

    fn predict(&mut self, init: &Sample, past: &Sample) -> f64 {
        self.weight * init.value() + (1.0 - self.weight) * past.value() + self.smoothing(init)
    }

    fn name(&self) -> &str {
        "IPro-Energy"
    }
}
