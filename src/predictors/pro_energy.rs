//! Pro-Energy: a blend whose trust in the origin reading decays with the
//! forecast distance.

use super::{check_unit_interval, Predictor};
use crate::core::{Sample, TimeSeries};
use crate::error::{ForecastError, Result};

/// `gamma * init + (1 - gamma) * past`, with
/// `gamma = w * (1 - ((t_past - t_init) / slot_step - 1) / c)` floored at 0.
///
/// `slot_step` is the spacing between the origin sample and the one before
/// it. With `c <= 0`, or when the origin has no predecessor, `gamma = w`.
#[derive(Debug, Clone)]
pub struct ProEnergyPredictor<'a> {
    current: &'a TimeSeries,
    reference: &'a TimeSeries,
    weight: f64,
    correlation: f64,
}

impl<'a> ProEnergyPredictor<'a> {
    /// Create a predictor; `weight` must lie in [0, 1] and `correlation`
    /// must not be negative.
    pub fn new(
        current: &'a TimeSeries,
        reference: &'a TimeSeries,
        weight: f64,
        correlation: f64,
    ) -> Result<Self> {
        check_unit_interval("weighting factor", weight)?;
        if correlation.is_nan() || correlation < 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "correlation factor must not be negative, got {correlation}"
            )));
        }
        Ok(Self {
            current,
            reference,
            weight,
            correlation,
        })
    }

    fn gamma(&self, init: &Sample, past: &Sample) -> f64 {
        if self.correlation <= 0.0 {
            return self.weight;
        }
        let previous = self
            .current
            .index_at_or_before(init.timeslot())
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.current.get(i));
        let Some(previous) = previous else {
            return self.weight;
        };
        let slot_step = (init.timeslot() - previous.timeslot()) as f64;
        if slot_step <= 0.0 {
            return self.weight;
        }
        let steps_ahead = (past.timeslot() - init.timeslot()) as f64 / slot_step;
        (self.weight * (1.0 - (steps_ahead - 1.0) / self.correlation)).max(0.0)
    }
}

impl Predictor for ProEnergyPredictor<'_> {
    fn current(&self) -> &TimeSeries {
        self.current
    }

    fn reference(&self) -> &TimeSeries {
        self.reference
    }

    fn predict(&mut self, init: &Sample, past: &Sample) -> f64 {
        let gamma = self.gamma(init, past);
        gamma * init.value() + (1.0 - gamma) * past.value()
    }

    fn name(&self) -> &str {
        "Pro-Energy"
    }
}
