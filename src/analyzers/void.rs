//! Analyzer for predictors that need no history.

use super::{admit, Analyzer};
use crate::core::{TimeSeries, Timeslot};
use crate::error::Result;
use std::borrow::Cow;

/// Always returns an empty reference series.
///
/// Used by self-referential predictors (Dumb, ARMA, SAA, WEP): looking a
/// timeslot up in the empty reference yields a zero sample at that timeslot.
///
/// Pooled series go through the usual admission checks and count towards
/// `pool_size`, but are never read.
#[derive(Debug, Clone, Default)]
pub struct VoidAnalyzer<'a> {
    /// Admitted series, kept for the count and the mode check only.
    pool: Vec<&'a TimeSeries>,
}

impl<'a> VoidAnalyzer<'a> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'a> Analyzer<'a> for VoidAnalyzer<'a> {
    fn add_series(&mut self, series: &'a TimeSeries) -> bool {
        admit(&mut self.pool, series)
    }

    fn pool_size(&self) -> usize {
        self.pool.len()
    }

    fn select_reference(
        &mut self,
        target: &TimeSeries,
        _origin: Timeslot,
        _window: usize,
    ) -> Result<Cow<'a, TimeSeries>> {
        Ok(Cow::Owned(target.derived("void")))
    }

    fn name(&self) -> &str {
        "Void"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ValueMode;

    #[test]
    fn returns_empty_series_in_target_mode() {
        let target = TimeSeries::from_values("t", ValueMode::Energy, 1, &[1.0, 2.0]).unwrap();
        let mut analyzer = VoidAnalyzer::new();
        let reference = analyzer.select_reference(&target, 1, 1).unwrap();
        assert!(reference.is_empty());
        assert_eq!(reference.label(), "void");
        assert_eq!(reference.mode(), ValueMode::Energy);
        assert!(matches!(reference, Cow::Owned(_)));
    }

    #[test]
    fn works_without_a_pool() {
        let target = TimeSeries::from_values("t", ValueMode::Power, 1, &[1.0]).unwrap();
        let mut analyzer = VoidAnalyzer::new();
        assert_eq!(analyzer.pool_size(), 0);
        let reference = analyzer.select_reference(&target, 1, 1).unwrap();
        assert_eq!(reference.value_at(5).value(), 0.0);
        assert_eq!(reference.value_at(5).timeslot(), 5);
    }

    #[test]
    fn pooled_series_are_counted_but_never_used() {
        let target = TimeSeries::from_values("t", ValueMode::Power, 1, &[1.0, 2.0]).unwrap();
        let day = TimeSeries::from_values("d", ValueMode::Power, 1, &[9.0, 9.0]).unwrap();
        let energy = TimeSeries::from_values("e", ValueMode::Energy, 1, &[9.0]).unwrap();
        let mut analyzer = VoidAnalyzer::new();
        assert!(analyzer.add_series(&day));
        assert!(!analyzer.add_series(&energy));
        assert_eq!(analyzer.pool_size(), 1);
        let reference = analyzer.select_reference(&target, 2, 2).unwrap();
        assert!(reference.is_empty());
    }
}
