//! Weighted error-adjusted prediction (WEP).

use super::{check_window, Predictor};
use crate::core::{Sample, TimeSeries};
use crate::error::Result;

/// Linearly weighted moving average over the last `window` samples, plus
/// the mean recent residual when error adjustment is on.
///
/// Predictions and residuals are buffered per sample index of the current
/// series: `predictions[i]` forecasts sample `i`, and `residuals[i]` is
/// `actual[i] - predictions[i]` for samples up to the origin. Beyond the
/// origin the average feeds on its own buffered predictions.
#[derive(Debug, Clone)]
pub struct WepPredictor<'a> {
    current: &'a TimeSeries,
    reference: &'a TimeSeries,
    window: usize,
    error_adjustment: bool,
    predictions: Vec<f64>,
    residuals: Vec<f64>,
}

impl<'a> WepPredictor<'a> {
    /// Create a predictor over `window` trailing samples, with error
    /// adjustment enabled.
    pub fn new(current: &'a TimeSeries, reference: &'a TimeSeries, window: usize) -> Result<Self> {
        check_window(window)?;
        Ok(Self {
            current,
            reference,
            window,
            error_adjustment: true,
            predictions: vec![0.0; current.len()],
            residuals: vec![0.0; current.len()],
        })
    }

    /// Toggle the residual correction. Without it the buffers are filled
    /// from the origin onwards only.
    pub fn with_error_adjustment(mut self, enabled: bool) -> Self {
        self.error_adjustment = enabled;
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn error_adjustment(&self) -> bool {
        self.error_adjustment
    }

    fn actual(&self, index: usize) -> f64 {
        self.current.get(index).map_or(0.0, Sample::value)
    }

    fn compute(&self, index: usize, origin: usize) -> f64 {
        let first = index.saturating_sub(self.window);
        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        let mut residuals = 0.0;
        for (weight, j) in (1u32..).zip(first..index) {
            let value = if j <= origin {
                self.actual(j)
            } else {
                self.predictions[j]
            };
            weighted += f64::from(weight) * value;
            total_weight += f64::from(weight);
            residuals += self.residuals[j];
        }
        let mut prediction = weighted / total_weight;
        if self.error_adjustment {
            prediction += residuals / (index - first) as f64;
        }
        prediction
    }
}

impl Predictor for WepPredictor<'_> {
    fn current(&self) -> &TimeSeries {
        self.current
    }

    fn reference(&self) -> &TimeSeries {
        self.reference
    }

    fn predict(&mut self, init: &Sample, past: &Sample) -> f64 {
        let (Some(origin), Some(target)) = (
            self.current.index_at_or_before(init.timeslot()),
            self.current.index_at_or_before(past.timeslot()),
        ) else {
            return 0.0;
        };
        if target == 0 {
            return self.actual(0);
        }
        let start = if self.error_adjustment {
            1
        } else {
            (origin + 1).min(target)
        };
        for index in start..=target {
            let prediction = self.compute(index, origin);
            self.predictions[index] = prediction;
            self.residuals[index] = if index <= origin {
                self.actual(index) - prediction
            } else {
                0.0
            };
        }
        self.predictions[target]
    }

    fn name(&self) -> &str {
        "WEP"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ValueMode;
    use approx::assert_relative_eq;

    fn series(values: &[f64]) -> TimeSeries {
        TimeSeries::from_values("s", ValueMode::Power, 1, values).unwrap()
    }

    #[test]
    fn unit_window_repeats_the_origin_first() {
        let s = series(&[1.0, 4.0, 2.0, 8.0, 5.0]);
        let mut predictor = WepPredictor::new(&s, &s, 1).unwrap().with_error_adjustment(false);
        let init = s.value_at(3); // index 2
        let value = predictor.predict(&init, &Sample::new(0.0, 4));
        assert_relative_eq!(value, 2.0, epsilon = 1e-12);
        // and keeps feeding on itself
        let value = predictor.predict(&init, &Sample::new(0.0, 5));
        assert_relative_eq!(value, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn weights_grow_towards_the_origin() {
        let s = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut predictor = WepPredictor::new(&s, &s, 2).unwrap().with_error_adjustment(false);
        let init = s.value_at(3); // index 2
        // (1 * 2 + 2 * 3) / 3
        let one = predictor.predict(&init, &Sample::new(0.0, 4));
        assert_relative_eq!(one, 8.0 / 3.0, epsilon = 1e-12);
        // (1 * 3 + 2 * pred[3]) / 3
        let two = predictor.predict(&init, &Sample::new(0.0, 5));
        assert_relative_eq!(two, (3.0 + 2.0 * 8.0 / 3.0) / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn residuals_correct_a_linear_trend() {
        let s = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut predictor = WepPredictor::new(&s, &s, 1).unwrap();
        assert!(predictor.error_adjustment());
        // pred[1] = 1, res[1] = 1
        // pred[2] = 2 + 1 = 3, res[2] = 0
        // pred[3] = 3 + 0
        let value = predictor.predict(&s.value_at(3), &Sample::new(0.0, 4));
        assert_relative_eq!(value, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn first_sample_target_is_the_actual() {
        let s = series(&[7.0, 2.0]);
        let mut predictor = WepPredictor::new(&s, &s, 3).unwrap();
        assert_eq!(predictor.predict(&s.value_at(1), &Sample::new(0.0, 1)), 7.0);
    }

    #[test]
    fn window_reaches_back_to_the_first_sample() {
        let s = series(&[4.0, 8.0, 6.0]);
        let mut predictor = WepPredictor::new(&s, &s, 2).unwrap();
        // sample 1 averages sample 0 alone, with no residual behind it
        let value = predictor.predict(&s.value_at(3), &Sample::new(0.0, 2));
        assert_relative_eq!(value, 4.0, epsilon = 1e-12);
        // sample 2: (1 * 4 + 2 * 8) / 3 plus the mean of residuals 0 and 4
        let value = predictor.predict(&s.value_at(3), &Sample::new(0.0, 3));
        assert_relative_eq!(value, 20.0 / 3.0 + 2.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_window_is_rejected() {
        let s = series(&[1.0]);
        assert!(WepPredictor::new(&s, &s, 0).is_err());
    }
}
