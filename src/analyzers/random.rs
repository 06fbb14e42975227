//! Analyzer picking a pool member uniformly at random.

use super::{admit, Analyzer};
use crate::core::{TimeSeries, Timeslot};
use crate::error::{ForecastError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::borrow::Cow;
use tracing::debug;

/// Uniformly random reference selection.
///
/// The generator is injectable; use [`RandomAnalyzer::with_seed`] for
/// reproducible runs.
///
/// # Example
/// ```
/// use harvest_forecast::analyzers::{Analyzer, RandomAnalyzer};
/// use harvest_forecast::core::{TimeSeries, ValueMode};
///
/// let a = TimeSeries::from_values("a", ValueMode::Power, 1, &[1.0]).unwrap();
/// let b = TimeSeries::from_values("b", ValueMode::Power, 1, &[2.0]).unwrap();
///
/// let mut analyzer = RandomAnalyzer::with_seed(42);
/// analyzer.add_series(&a);
/// analyzer.add_series(&b);
/// let picked = analyzer.select_reference(&a, 1, 1).unwrap();
/// assert!(picked.label() == "a" || picked.label() == "b");
/// ```
#[derive(Debug, Clone)]
pub struct RandomAnalyzer<'a, R: Rng = StdRng> {
    pool: Vec<&'a TimeSeries>,
    rng: R,
}

impl<'a> RandomAnalyzer<'a, StdRng> {
    /// Seeded from system entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic generator for reproducible selection.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<'a> Default for RandomAnalyzer<'a, StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, R: Rng> RandomAnalyzer<'a, R> {
    /// Use a caller-provided generator.
    pub fn with_rng(rng: R) -> Self {
        Self {
            pool: Vec::new(),
            rng,
        }
    }
}

impl<'a, R: Rng> Analyzer<'a> for RandomAnalyzer<'a, R> {
    fn add_series(&mut self, series: &'a TimeSeries) -> bool {
        admit(&mut self.pool, series)
    }

    fn pool_size(&self) -> usize {
        self.pool.len()
    }

    fn select_reference(
        &mut self,
        _target: &TimeSeries,
        _origin: Timeslot,
        _window: usize,
    ) -> Result<Cow<'a, TimeSeries>> {
        if self.pool.is_empty() {
            return Err(ForecastError::EmptyPool);
        }
        let index = self.rng.gen_range(0..self.pool.len());
        let selected = self.pool[index];
        debug!(index, label = %selected.label(), "randomly selected reference");
        Ok(Cow::Borrowed(selected))
    }

    fn name(&self) -> &str {
        "Random"
    }
}
