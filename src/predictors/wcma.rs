//! Weather-conditioned moving average predictors (D-WCMA and UD-WCMA) and
//! the GAP factor they share.

use super::{check_window, Predictor};
use crate::analyzers::WeightingFactors;
use crate::core::{Sample, TimeSeries, Timeslot};
use crate::error::Result;
use tracing::debug;

/// Day-over-day amplitude correction.
///
/// A weighted ratio of current to reference values over the `window` samples
/// ending at the origin, the most recent sample weighing most:
/// `2 * Σ_{i=1..window} i * current[j] / reference[j] / (window * (window + 1))`
/// with `j = idx(origin) - window + i`. Samples before the start of either
/// series and zero reference values are skipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapFactor(f64);

impl GapFactor {
    pub fn compute(
        current: &TimeSeries,
        reference: &TimeSeries,
        origin: Timeslot,
        window: usize,
    ) -> Self {
        let Some(origin_index) = current.index_at_or_before(origin) else {
            return Self(0.0);
        };
        let mut sum = 0.0;
        for i in 1..=window {
            let Some(j) = (origin_index + i).checked_sub(window) else {
                continue;
            };
            let (Some(now), Some(then)) = (current.get(j), reference.get(j)) else {
                continue;
            };
            if then.value() == 0.0 {
                continue;
            }
            sum += i as f64 * now.value() / then.value();
        }
        let window = window as f64;
        Self(2.0 * sum / window / (window + 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// D-WCMA: `alpha(t) * init + (1 - alpha(t)) * GAP * past`.
///
/// `alpha` comes from the Average analyzer's weighting factors; the GAP
/// factor is computed once at construction.
#[derive(Debug, Clone)]
pub struct DwcmaPredictor<'a> {
    current: &'a TimeSeries,
    reference: &'a TimeSeries,
    alpha: &'a TimeSeries,
    gap: GapFactor,
}

impl<'a> DwcmaPredictor<'a> {
    pub fn new(
        current: &'a TimeSeries,
        reference: &'a TimeSeries,
        factors: &'a WeightingFactors,
        origin: Timeslot,
        window: usize,
    ) -> Result<Self> {
        check_window(window)?;
        let gap = GapFactor::compute(current, reference, origin, window);
        debug!(origin, gap = gap.value(), "D-WCMA gap factor");
        Ok(Self {
            current,
            reference,
            alpha: &factors.alpha,
            gap,
        })
    }

    pub fn gap(&self) -> GapFactor {
        self.gap
    }
}

impl Predictor for DwcmaPredictor<'_> {
    fn current(&self) -> &TimeSeries {
        self.current
    }

    fn reference(&self) -> &TimeSeries {
        self.reference
    }

    fn predict(&mut self, init: &Sample, past: &Sample) -> f64 {
        let alpha = self.alpha.value_at(past.timeslot()).value();
        alpha * init.value() + (1.0 - alpha) * self.gap.value() * past.value()
    }

    fn name(&self) -> &str {
        "D-WCMA"
    }
}

/// UD-WCMA: D-WCMA that also blends in the most similar historical day.
///
/// `alpha * (beta * init + (1 - beta) * similar(t)) + (1 - alpha) * GAP * past`.
#[derive(Debug, Clone)]
pub struct UdwcmaPredictor<'a> {
    current: &'a TimeSeries,
    reference: &'a TimeSeries,
    similar: &'a TimeSeries,
    alpha: &'a TimeSeries,
    beta: &'a TimeSeries,
    gap: GapFactor,
}

impl<'a> UdwcmaPredictor<'a> {
    pub fn new(
        current: &'a TimeSeries,
        reference: &'a TimeSeries,
        similar: &'a TimeSeries,
        factors: &'a WeightingFactors,
        origin: Timeslot,
        window: usize,
    ) -> Result<Self> {
        check_window(window)?;
        let gap = GapFactor::compute(current, reference, origin, window);
        debug!(origin, gap = gap.value(), similar = %similar.label(), "UD-WCMA gap factor");
        Ok(Self {
            current,
            reference,
            similar,
            alpha: &factors.alpha,
            beta: &factors.beta,
            gap,
        })
    }

    pub fn gap(&self) -> GapFactor {
        self.gap
    }
}

impl Predictor for UdwcmaPredictor<'_> {
    fn current(&self) -> &TimeSeries {
        self.current
    }

    fn reference(&self) -> &TimeSeries {
        self.reference
    }

    fn predict(&mut self, init: &Sample, past: &Sample) -> f64 {
        let timeslot = past.timeslot();
        let alpha = self.alpha.value_at(timeslot).value();
        let beta = self.beta.value_at(timeslot).value();
        let similar = self.similar.value_at(timeslot).value();
        alpha * (beta * init.value() + (1.0 - beta) * similar)
            + (1.0 - alpha) * self.gap.value() * past.value()
    }

    fn name(&self) -> &str {
        "UD-WCMA"
    }
}
