//! Flat carry-forward of the origin reading.

use super::Predictor;
use crate::core::{Sample, TimeSeries};

/// Predicts the origin reading for every target.
///
/// # Example
/// ```
/// use harvest_forecast::core::{Sample, TimeSeries, ValueMode};
/// use harvest_forecast::predictors::{DumbPredictor, Predictor};
///
/// let series = TimeSeries::from_values("day", ValueMode::Power, 1, &[3.0, 4.0]).unwrap();
/// let mut predictor = DumbPredictor::new(&series, &series);
/// assert_eq!(predictor.predict(&Sample::new(3.0, 1), &Sample::new(9.0, 2)), 3.0);
/// ```
#[derive(Debug, Clone)]
pub struct DumbPredictor<'a> {
    current: &'a TimeSeries,
    reference: &'a TimeSeries,
}

impl<'a> DumbPredictor<'a> {
    pub fn new(current: &'a TimeSeries, reference: &'a TimeSeries) -> Self {
        Self { current, reference }
    }
}

impl Predictor for DumbPredictor<'_> {
    fn current(&self) -> &TimeSeries {
        self.current
    }

    fn reference(&self) -> &TimeSeries {
        self.reference
    }

    fn predict(&mut self, init: &Sample, _past: &Sample) -> f64 {
        init.value()
    }

    fn name(&self) -> &str {
        "Dumb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ValueMode;

    #[test]
    fn ignores_the_reference() {
        let series = TimeSeries::from_values("s", ValueMode::Power, 1, &[1.0]).unwrap();
        let mut predictor = DumbPredictor::new(&series, &series);
        for past in [-5.0, 0.0, 1e9] {
            assert_eq!(predictor.predict(&Sample::new(7.5, 1), &Sample::new(past, 4)), 7.5);
        }
    }
}
