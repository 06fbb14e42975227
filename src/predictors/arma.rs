//! Fixed-coefficient ARMA(p, q) recursion over the current series.

use super::Predictor;
use crate::core::{Sample, TimeSeries};
use crate::error::{ForecastError, Result};

/// Recursive ARMA forecast with caller-supplied coefficients.
///
/// Predictions are built in a buffer indexed by absolute sample index:
///
/// ```text
/// pred[i] = Σ_p ar[p] * (i > init + p ? pred[i - p] : actual[i - p])
///         - Σ_q ma[q] * (i > init + q || pred[i - q] == 0 ? 0 : actual[i - q] - pred[i - q])
/// ```
///
/// The buffer starts right after the origin when the MA part is absent or
/// its first coefficient is 0. Otherwise it starts at `max(p + 1, q)`, so the
/// in-sample residuals before the origin feed the MA terms. Lags reaching
/// before the first sample contribute nothing.
#[derive(Debug, Clone)]
pub struct ArmaPredictor<'a> {
    current: &'a TimeSeries,
    reference: &'a TimeSeries,
    ar: Vec<f64>,
    ma: Vec<f64>,
    buffer: Vec<f64>,
}

impl<'a> ArmaPredictor<'a> {
    /// Create a predictor. At least one AR coefficient is required.
    pub fn new(
        current: &'a TimeSeries,
        reference: &'a TimeSeries,
        ar: Vec<f64>,
        ma: Vec<f64>,
    ) -> Result<Self> {
        if ar.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "ARMA needs at least one AR coefficient".to_string(),
            ));
        }
        if ar.iter().chain(ma.iter()).any(|c| !c.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "ARMA coefficients must be finite".to_string(),
            ));
        }
        Ok(Self {
            current,
            reference,
            ar,
            ma,
            buffer: Vec::new(),
        })
    }

    pub fn ar(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma(&self) -> &[f64] {
        &self.ma
    }

    fn first_index(&self, init_index: usize) -> usize {
        match self.ma.first() {
            None => init_index + 1,
            Some(&c) if c == 0.0 => init_index + 1,
            Some(_) => (self.ar.len() + 1).max(self.ma.len()),
        }
    }

    fn actual(&self, index: usize) -> f64 {
        self.current.get(index).map_or(0.0, Sample::value)
    }
}

impl Predictor for ArmaPredictor<'_> {
    fn current(&self) -> &TimeSeries {
        self.current
    }

    fn reference(&self) -> &TimeSeries {
        self.reference
    }

    fn predict(&mut self, init: &Sample, past: &Sample) -> f64 {
        let (Some(init_index), Some(past_index)) = (
            self.current.index_at_or_before(init.timeslot()),
            self.current.index_at_or_before(past.timeslot()),
        ) else {
            return 0.0;
        };
        let first = self.first_index(init_index);

        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.clear();
        buffer.resize(past_index + 1, 0.0);

        for i in first..=past_index {
            let mut value = 0.0;
            for (lag, coefficient) in (1..).zip(&self.ar) {
                if lag > i {
                    break;
                }
                let term = if i > init_index + lag {
                    buffer[i - lag]
                } else {
                    self.actual(i - lag)
                };
                value += coefficient * term;
            }
            for (lag, coefficient) in (1..).zip(&self.ma) {
                if lag > i {
                    break;
                }
                let predicted = buffer[i - lag];
                if i > init_index + lag || predicted == 0.0 {
                    continue;
                }
                value -= coefficient * (self.actual(i - lag) - predicted);
            }
            buffer[i] = value;
        }

        let prediction = buffer[past_index];
        self.buffer = buffer;
        prediction
    }

    fn name(&self) -> &str {
        "ARMA"
    }
}
