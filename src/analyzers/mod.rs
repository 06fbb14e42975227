//! Strategies that pick, or synthesize, the historical series a predictor
//! forecasts from.
//!
//! An analyzer holds a pool of borrowed historical traces. Given the series
//! being forecast (the target), an origin timeslot and a trailing window, it
//! returns a reference series: either one pool member, borrowed, or a freshly
//! built combination.

mod average;
mod mae;
mod random;
mod void;

pub use average::{AverageAnalyzer, WeightingFactors};
pub use mae::MaeAnalyzer;
pub use random::RandomAnalyzer;
pub use void::VoidAnalyzer;

use crate::core::{TimeSeries, Timeslot};
use crate::error::Result;
use std::borrow::Cow;
use tracing::debug;

/// Common interface for reference-selection strategies.
///
/// # Example
/// ```
/// use harvest_forecast::analyzers::{Analyzer, MaeAnalyzer};
/// use harvest_forecast::core::{TimeSeries, ValueMode};
///
/// let monday = TimeSeries::from_values("mon", ValueMode::Power, 1, &[1.0, 5.0, 9.0]).unwrap();
/// let tuesday = TimeSeries::from_values("tue", ValueMode::Power, 1, &[2.0, 3.0, 4.0]).unwrap();
/// let today = TimeSeries::from_values("today", ValueMode::Power, 1, &[1.0, 4.5, 0.0]).unwrap();
///
/// let mut analyzer = MaeAnalyzer::new(1);
/// analyzer.add_series(&monday);
/// analyzer.add_series(&tuesday);
/// let reference = analyzer.select_reference(&today, 2, 2).unwrap();
/// assert_eq!(reference.label(), "mon");
/// ```
pub trait Analyzer<'a> {
    /// Add a historical series to the pool.
    ///
    /// Returns `false` when the series is rejected: it is empty, or its value
    /// mode differs from the series already pooled.
    fn add_series(&mut self, series: &'a TimeSeries) -> bool;

    /// Number of pooled series.
    fn pool_size(&self) -> usize;

    /// Select the reference series for forecasting `target` from `origin`,
    /// judging similarity over the `window` samples ending at `origin`.
    fn select_reference(
        &mut self,
        target: &TimeSeries,
        origin: Timeslot,
        window: usize,
    ) -> Result<Cow<'a, TimeSeries>>;

    /// Analyzer name.
    fn name(&self) -> &str;
}

/// Pool admission shared by every analyzer.
pub(crate) fn admit<'a>(pool: &mut Vec<&'a TimeSeries>, series: &'a TimeSeries) -> bool {
    if series.is_empty() {
        debug!(label = %series.label(), "rejected empty series");
        return false;
    }
    if let Some(first) = pool.first() {
        if first.mode() != series.mode() {
            debug!(
                label = %series.label(),
                expected = ?first.mode(),
                got = ?series.mode(),
                "rejected series with mismatched value mode"
            );
            return false;
        }
    }
    pool.push(series);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ValueMode;

    #[test]
    fn admission_checks_emptiness_and_mode() {
        let power = TimeSeries::from_values("p", ValueMode::Power, 1, &[1.0]).unwrap();
        let energy = TimeSeries::from_values("e", ValueMode::Energy, 1, &[1.0]).unwrap();
        let empty = TimeSeries::new("x", ValueMode::Power);

        let mut pool = Vec::new();
        assert!(!admit(&mut pool, &empty));
        assert!(admit(&mut pool, &power));
        assert!(!admit(&mut pool, &energy));
        assert!(admit(&mut pool, &power));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn analyzers_are_object_safe() {
        let series = TimeSeries::from_values("p", ValueMode::Power, 1, &[1.0, 2.0]).unwrap();
        let mut analyzers: Vec<Box<dyn Analyzer<'_>>> = vec![
            Box::new(VoidAnalyzer::new()),
            Box::new(RandomAnalyzer::with_seed(7)),
            Box::new(MaeAnalyzer::new(1)),
            Box::new(AverageAnalyzer::new()),
        ];
        for analyzer in analyzers.iter_mut() {
            assert!(analyzer.add_series(&series));
            assert_eq!(analyzer.pool_size(), 1);
            assert!(analyzer.select_reference(&series, 2, 2).is_ok());
        }
        let names: Vec<_> = analyzers.iter().map(|a| a.name().to_string()).collect();
        assert_eq!(names, vec!["Void", "Random", "MAE", "Average"]);
    }
}
