//! Exponentially weighted blend of the current and reference readings.

use super::{check_unit_interval, Predictor};
use crate::core::{Sample, TimeSeries};
use crate::error::Result;

/// `alpha * init + (1 - alpha) * past`.
#[derive(Debug, Clone)]
pub struct EwmaPredictor<'a> {
    current: &'a TimeSeries,
    reference: &'a TimeSeries,
    alpha: f64,
}

impl<'a> EwmaPredictor<'a> {
    /// Create a predictor; `alpha` must lie in [0, 1].
    pub fn new(current: &'a TimeSeries, reference: &'a TimeSeries, alpha: f64) -> Result<Self> {
        check_unit_interval("alpha", alpha)?;
        Ok(Self {
            current,
            reference,
            alpha,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Predictor for EwmaPredictor<'_> {
    fn current(&self) -> &TimeSeries {
        self.current
    }

    fn reference(&self) -> &TimeSeries {
        self.reference
    }

    fn predict(&mut self, init: &Sample, past: &Sample) -> f64 {
        self.alpha * init.value() + (1.0 - self.alpha) * past.value()
    }

    fn name(&self) -> &str {
        "EWMA"
    }
}
