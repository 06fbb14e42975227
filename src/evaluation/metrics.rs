//! Accuracy metrics for one forecast horizon.

use crate::error::{ForecastError, Result};

/// Accuracy of the forecasts filed under one horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error over actual values above the
    /// threshold (None if no value qualifies)
    pub mape: Option<f64>,
    /// Mean Absolute Scaled Error against the one-step naive forecast
    /// (None if the actual values never change)
    pub mase: Option<f64>,
    /// Mean Absolute Deviation Percentage (None if the actuals sum to 0)
    pub madp: Option<f64>,
    /// Number of scored forecasts.
    pub count: usize,
}

/// Calculate accuracy metrics between actual and predicted values.
///
/// Percentage errors only count actual values strictly above
/// `mape_threshold`; non-positive actuals contribute a 0% error.
///
/// # Example
/// ```
/// use harvest_forecast::evaluation::horizon_metrics;
///
/// let m = horizon_metrics(&[10.0, 20.0], &[12.0, 18.0], 1.0).unwrap();
/// assert_eq!(m.mae, 2.0);
/// assert_eq!(m.count, 2);
/// ```
pub fn horizon_metrics(
    actual: &[f64],
    predicted: &[f64],
    mape_threshold: f64,
) -> Result<HorizonMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }

    let mut accumulator = MetricsAccumulator::default();
    for (&a, &p) in actual.iter().zip(predicted) {
        accumulator.push(a, p, mape_threshold);
    }
    accumulator.finish().ok_or(ForecastError::EmptyData)
}

/// Running sums behind [`HorizonMetrics`], allowing a different MAPE
/// threshold for every point.
#[derive(Debug, Clone, Default)]
pub(crate) struct MetricsAccumulator {
    count: usize,
    sum_abs_error: f64,
    sum_squared_error: f64,
    sum_percent_error: f64,
    percent_count: usize,
    sum_actual: f64,
    sum_actual_change: f64,
    previous_actual: Option<f64>,
}

impl MetricsAccumulator {
    pub(crate) fn push(&mut self, actual: f64, predicted: f64, mape_threshold: f64) {
        let abs_error = (actual - predicted).abs();
        self.count += 1;
        self.sum_abs_error += abs_error;
        self.sum_squared_error += abs_error * abs_error;
        self.sum_actual += actual;

        if actual > mape_threshold {
            self.sum_percent_error += if actual > 0.0 {
                abs_error * 100.0 / actual
            } else {
                0.0
            };
            self.percent_count += 1;
        }

        // negative actuals never seed the naive baseline
        if let Some(previous) = self.previous_actual.filter(|p| *p >= 0.0) {
            self.sum_actual_change += (actual - previous).abs();
        }
        self.previous_actual = Some(actual);
    }

    pub(crate) fn finish(&self) -> Option<HorizonMetrics> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;

        let mape = (self.percent_count > 0)
            .then(|| self.sum_percent_error / self.percent_count as f64);
        let mase = (self.sum_actual_change != 0.0)
            .then(|| self.sum_abs_error * (n - 1.0) / n / self.sum_actual_change);
        let madp = (self.sum_actual != 0.0).then(|| self.sum_abs_error * 100.0 / self.sum_actual);

        Some(HorizonMetrics {
            mae: self.sum_abs_error / n,
            rmse: (self.sum_squared_error / n).sqrt(),
            mape,
            mase,
            madp,
            count: self.count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_perfect_forecast() {
        let actual = vec![1.0, 2.0, 3.0, 4.0];
        let metrics = horizon_metrics(&actual, &actual, 0.0).unwrap();
        assert_relative_eq!(metrics.mae, 0.0);
        assert_relative_eq!(metrics.rmse, 0.0);
        assert_eq!(metrics.mape, Some(0.0));
        assert_eq!(metrics.mase, Some(0.0));
        assert_eq!(metrics.madp, Some(0.0));
        assert_eq!(metrics.count, 4);
    }

    #[test]
    fn test_known_errors() {
        let actual = vec![10.0, 20.0, 30.0];
        let predicted = vec![12.0, 17.0, 30.0];
        let m = horizon_metrics(&actual, &predicted, 0.0).unwrap();

        assert_relative_eq!(m.mae, 5.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(m.rmse, (13.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
        // (20% + 15% + 0%) / 3
        assert_relative_eq!(m.mape.unwrap(), 35.0 / 3.0, epsilon = 1e-12);
        // 5 * 2/3 / 20
        assert_relative_eq!(m.mase.unwrap(), 5.0 * 2.0 / 3.0 / 20.0, epsilon = 1e-12);
        assert_relative_eq!(m.madp.unwrap(), 500.0 / 60.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mape_threshold_filters_small_actuals() {
        let actual = vec![0.5, 10.0];
        let predicted = vec![1.5, 11.0];
        let m = horizon_metrics(&actual, &predicted, 1.0).unwrap();
        assert_relative_eq!(m.mape.unwrap(), 10.0, epsilon = 1e-12);

        let m = horizon_metrics(&actual, &predicted, 100.0).unwrap();
        assert_eq!(m.mape, None);
    }

    #[test]
    fn test_degenerate_denominators() {
        let m = horizon_metrics(&[0.0, 0.0], &[1.0, 1.0], 0.0).unwrap();
        assert_eq!(m.mase, None);
        assert_eq!(m.madp, None);
        assert_eq!(m.mape, None);
        assert_relative_eq!(m.mae, 1.0);
    }

    #[test]
    fn test_negative_actuals_skip_naive_baseline() {
        let mut acc = MetricsAccumulator::default();
        acc.push(-1.0, 0.0, 0.0);
        acc.push(3.0, 3.0, 0.0);
        acc.push(5.0, 5.0, 0.0);
        let m = acc.finish().unwrap();
        // only |5 - 3| enters the MASE denominator
        assert_relative_eq!(m.mase.unwrap(), 1.0 * 2.0 / 3.0 / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_per_point_thresholds() {
        let mut acc = MetricsAccumulator::default();
        acc.push(10.0, 11.0, 20.0);
        acc.push(10.0, 12.0, 5.0);
        assert_relative_eq!(acc.finish().unwrap().mape.unwrap(), 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_and_mismatched_inputs() {
        assert_eq!(horizon_metrics(&[], &[], 0.0), Err(ForecastError::EmptyData));
        assert_eq!(
            horizon_metrics(&[1.0, 2.0], &[1.0], 0.0),
            Err(ForecastError::DimensionMismatch {
                expected: 2,
                got: 1
            })
        );
        assert!(MetricsAccumulator::default().finish().is_none());
    }
}
