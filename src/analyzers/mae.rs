//! Analyzer ranking the pool by mean absolute error over a trailing window.

use super::{admit, Analyzer};
use crate::core::{TimeSeries, Timeslot};
use crate::error::{ForecastError, Result};
use std::borrow::Cow;
use tracing::debug;

/// Mean-absolute-error reference selection.
///
/// Each pool member is scored against the target over the `window` samples
/// ending at the origin, aligned by timeslot. With `combine <= 1` the best
/// member is returned. Otherwise the `k = min(combine, pool)` best members
/// are blended at every target timeslot with weights `1 - mae_i / Σmae`,
/// divided by `k - 1` (those weights sum to `k - 1`).
#[derive(Debug, Clone)]
pub struct MaeAnalyzer<'a> {
    pool: Vec<&'a TimeSeries>,
    combine: usize,
}

impl<'a> MaeAnalyzer<'a> {
    /// Create an analyzer blending the `combine` best members.
    pub fn new(combine: usize) -> Self {
        Self {
            pool: Vec::new(),
            combine,
        }
    }

    pub fn combine(&self) -> usize {
        self.combine
    }

    /// Pool members paired with their window MAE, best first.
    ///
    /// Ties keep pool order.
    pub fn ranking(
        &self,
        target: &TimeSeries,
        origin: Timeslot,
        window: usize,
    ) -> Result<Vec<(f64, &'a TimeSeries)>> {
        let mut scored = self
            .pool
            .iter()
            .map(|&member| Ok((window_mae(target, member, origin, window)?, member)))
            .collect::<Result<Vec<_>>>()?;
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(scored)
    }
}

/// MAE between `target` and `other` over the samples of `target` in
/// `[max(0, idx(origin) - window + 1), idx(origin)]`.
pub(crate) fn window_mae(
    target: &TimeSeries,
    other: &TimeSeries,
    origin: Timeslot,
    window: usize,
) -> Result<f64> {
    let last = target
        .index_at_or_before(origin)
        .ok_or(ForecastError::EmptyData)?;
    let first = (last + 1).saturating_sub(window.max(1));
    let samples = &target.samples()[first..=last];
    let total: f64 = samples
        .iter()
        .map(|s| (s.value() - other.value_at(s.timeslot()).value()).abs())
        .sum();
    Ok(total / samples.len() as f64)
}

impl<'a> Analyzer<'a> for MaeAnalyzer<'a> {
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
        let ranking = self.ranking(target, origin, window)?;
        let k = self.combine.min(ranking.len());
        if k <= 1 {
            let (mae, best) = ranking[0];
            debug!(label = %best.label(), mae, "selected closest reference");
            return Ok(Cow::Borrowed(best));
        }

        let top = &ranking[..k];
        let sum_mae: f64 = top.iter().map(|(mae, _)| mae).sum();
        debug!(
            members = k,
            sum_mae,
            best = %top[0].1.label(),
            "combining closest references"
        );

        let mut combined = target.derived("mae");
        for sample in target.samples() {
            let timeslot = sample.timeslot();
            let value = if sum_mae > 0.0 {
                top.iter()
                    .map(|(mae, member)| (1.0 - mae / sum_mae) * member.value_at(timeslot).value())
                    .sum::<f64>()
                    / (k - 1) as f64
            } else {
                top.iter()
                    .map(|(_, member)| member.value_at(timeslot).value())
                    .sum::<f64>()
                    / k as f64
            };
            combined.append(value, timeslot)?;
        }
        Ok(Cow::Owned(combined))
    }

    fn name(&self) -> &str {
        "MAE"
    }
}
