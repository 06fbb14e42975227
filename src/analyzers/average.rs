//! Pointwise pool average, plus the weighting factors used by the
//! D-WCMA and UD-WCMA predictors.

use super::{admit, Analyzer};
use crate::core::{TimeSeries, Timeslot};
use crate::error::{ForecastError, Result};
use statrs::statistics::Statistics;
use std::borrow::Cow;
use tracing::debug;

/// Per-timeslot factors computed alongside the pool average, from the
/// origin to the end of the pool.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightingFactors {
    /// Cross-pool standard deviation around the average.
    pub deviation: TimeSeries,
    /// Mean change of the pool members since the origin.
    pub drift: TimeSeries,
    /// Confidence in the current reading versus the scaled history.
    pub alpha: TimeSeries,
    /// Confidence in the current reading versus the most similar day.
    pub beta: TimeSeries,
    /// Population standard deviation of the target's recent first differences.
    pub drift_deviation: f64,
}

/// Reference selection by pointwise averaging over the whole pool.
///
/// The average runs over the common length of the pool (the shortest
/// member) and takes its timeslots from the first member. Each selection
/// also recomputes the [`WeightingFactors`], available through
/// [`AverageAnalyzer::factors`] until the next selection.
#[derive(Debug, Clone, Default)]
pub struct AverageAnalyzer<'a> {
    pool: Vec<&'a TimeSeries>,
    factors: Option<WeightingFactors>,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

impl<'a> AverageAnalyzer<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factors from the last selection.
    pub fn factors(&self) -> Option<&WeightingFactors> {
        self.factors.as_ref()
    }

    pub fn alpha_factors(&self) -> Option<&TimeSeries> {
        self.factors.as_ref().map(|f| &f.alpha)
    }

    pub fn beta_factors(&self) -> Option<&TimeSeries> {
        self.factors.as_ref().map(|f| &f.beta)
    }

    fn common_len(&self) -> usize {
        self.pool.iter().map(|s| s.len()).min().unwrap_or(0)
    }

    fn average(&self, target: &TimeSeries, len: usize) -> Result<TimeSeries> {
        let mut average = target.derived("average");
        let count = self.pool.len() as f64;
        for index in 0..len {
            let sum: f64 = self.pool.iter().map(|s| s.samples()[index].value()).sum();
            average.append(sum / count, self.pool[0].samples()[index].timeslot())?;
        }
        Ok(average)
    }

    fn weighting_factors(
        &self,
        target: &TimeSeries,
        average: &TimeSeries,
        origin: Timeslot,
        window: usize,
    ) -> Result<WeightingFactors> {
        let len = average.len();
        let count = self.pool.len() as f64;
        let start = self.pool[0].index_at_or_before(origin).unwrap_or(0);
        let at_origin: Vec<f64> = self.pool.iter().map(|s| s.value_at(origin).value()).collect();

        let mut deviation = target.derived("deviation");
        let mut drift = target.derived("drift");
        for index in start..len {
            let mean = average.samples()[index].value();
            let timeslot = average.samples()[index].timeslot();
            let mut squared = 0.0;
            let mut change = 0.0;
            for (member, origin_value) in self.pool.iter().zip(&at_origin) {
                let value = member.samples()[index].value();
                squared += (value - mean).powi(2);
                change += value - origin_value;
            }
            deviation.append((squared / count).sqrt(), timeslot)?;
            drift.append(change / count, timeslot)?;
        }

        let drift_deviation = recent_difference_deviation(target, origin, window);

        let mut alpha = target.derived("alpha");
        let mut beta = target.derived("beta");
        for drift_sample in drift.samples() {
            let timeslot = drift_sample.timeslot();
            let dev = deviation.value_at(timeslot).value();
            let spread = self
                .pool
                .iter()
                .zip(&at_origin)
                .map(|(member, origin_value)| {
                    (member.value_at(timeslot).value() - origin_value - drift_sample.value()).powi(2)
                })
                .sum::<f64>()
                / count;
            let a = ratio(dev, dev + spread.sqrt()) / 2.0;
            let b = a + ratio(dev, dev + drift_deviation) / 2.0;
            alpha.append(a, timeslot)?;
            beta.append(b, timeslot)?;
        }

        Ok(WeightingFactors {
            deviation,
            drift,
            alpha,
            beta,
            drift_deviation,
        })
    }
}

/// Population standard deviation of the `window - 1` first differences of
/// `target` ending at the origin; 0 when there are none.
fn recent_difference_deviation(target: &TimeSeries, origin: Timeslot, window: usize) -> f64 {
    let Some(end) = target.index_at_or_before(origin) else {
        return 0.0;
    };
    let first = (end + 2).saturating_sub(window).max(1);
    if first > end {
        return 0.0;
    }
    let samples = target.samples();
    let differences: Vec<f64> = (first..=end)
        .map(|i| samples[i].value() - samples[i - 1].value())
        .collect();
    differences.iter().population_std_dev()
}

impl<'a> Analyzer<'a> for AverageAnalyzer<'a> {
    fn add_series(&mut self, series: &'a TimeSeries) -> bool {
        admit(&mut self.pool, series)
    }

    fn pool_size(&self) -> usize {
        self.pool.len()
    }

    fn select_reference(
        &mut self,
        target: &TimeSeries,
        origin: Timeslot,
        window: usize,
    ) -> Result<Cow<'a, TimeSeries>> {
        if self.pool.is_empty() {
            return Err(ForecastError::EmptyPool);
        }
        let average = self.average(target, self.common_len())?;
        let factors = self.weighting_factors(target, &average, origin, window)?;
        debug!(
            members = self.pool.len(),
            samples = average.len(),
            drift_deviation = factors.drift_deviation,
            "averaged pool"
        );
        self.factors = Some(factors);
        Ok(Cow::Owned(average))
    }

    fn name(&self) -> &str {
        "Average"
    }
}
