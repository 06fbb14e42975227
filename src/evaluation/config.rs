//! Evaluation settings and predictor selection.

use crate::core::Timeslot;
use crate::error::{ForecastError, Result};
use crate::predictors::SaaModel;
use crate::trig::TrigApprox;

/// Configuration for a rolling-origin forecast evaluation.
///
/// Origins run from `origin` (inclusive) to `final_slot` (exclusive) every
/// `slot_step`; each origin forecasts `horizon` timeslots ahead every
/// `prediction_step`.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationConfig {
    /// First forecast origin.
    pub origin: Timeslot,
    /// End of the evaluated range.
    pub final_slot: Timeslot,
    /// Spacing between forecast origins.
    pub slot_step: Timeslot,
    /// How far ahead every origin forecasts.
    pub horizon: Timeslot,
    /// Spacing between forecasts of one origin (0 means `slot_step`).
    pub prediction_step: Timeslot,
    /// Trailing samples used for reference selection and windowed predictors.
    pub window: usize,
    /// Score the harvested energy accumulated since the origin instead of
    /// the raw values.
    pub accumulated: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            origin: 0,
            final_slot: 0,
            slot_step: 1,
            horizon: 1,
            prediction_step: 1,
            window: 1,
            accumulated: false,
        }
    }
}

impl EvaluationConfig {
    /// Evaluate origins in `[origin, final_slot)`.
    ///
    /// With both at 0 the range is derived from the challenge: sunrise to
    /// sunset for solar traces, the whole trace otherwise.
    pub fn new(origin: Timeslot, final_slot: Timeslot) -> Self {
        Self {
            origin,
            final_slot,
            ..Self::default()
        }
    }

    pub fn with_slot_step(mut self, slot_step: Timeslot) -> Self {
        self.slot_step = slot_step;
        self
    }

    /// Set the horizon and the spacing of forecasts within it.
    pub fn with_horizon(mut self, horizon: Timeslot, prediction_step: Timeslot) -> Self {
        self.horizon = horizon;
        self.prediction_step = prediction_step;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_accumulated(mut self, accumulated: bool) -> Self {
        self.accumulated = accumulated;
        self
    }

    /// `prediction_step`, or `slot_step` when it is 0.
    pub fn effective_prediction_step(&self) -> Timeslot {
        if self.prediction_step == 0 {
            self.slot_step
        } else {
            self.prediction_step
        }
    }

    /// Number of horizon buckets.
    pub fn horizon_count(&self) -> usize {
        let step = self.effective_prediction_step();
        if step <= 0 || self.horizon <= 0 {
            return 0;
        }
        (self.horizon / step) as usize
    }

    /// Check the settings for consistency.
    pub fn validate(&self) -> Result<()> {
        if self.origin < 0 {
            return Err(invalid(format!("origin must not be negative, got {}", self.origin)));
        }
        if self.final_slot < self.origin {
            return Err(invalid(format!(
                "final timeslot {} precedes origin {}",
                self.final_slot, self.origin
            )));
        }
        if self.slot_step <= 0 {
            return Err(invalid(format!(
                "timeslot step must be positive, got {}",
                self.slot_step
            )));
        }
        if self.prediction_step < 0 {
            return Err(invalid(format!(
                "prediction step must not be negative, got {}",
                self.prediction_step
            )));
        }
        if self.horizon < self.effective_prediction_step() {
            return Err(invalid(format!(
                "horizon {} is shorter than the prediction step {}",
                self.horizon,
                self.effective_prediction_step()
            )));
        }
        if self.origin > 0 && self.final_slot > 0 && self.final_slot < self.origin + self.horizon {
            return Err(invalid(format!(
                "range [{}, {}) cannot hold a horizon of {}",
                self.origin, self.final_slot, self.horizon
            )));
        }
        if self.window == 0 {
            return Err(invalid("window must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> ForecastError {
    ForecastError::InvalidParameter(message)
}

/// Predictor to evaluate, with its parameters.
///
/// Each variant is paired with the analyzer it was designed for: no pool
/// for Dumb, ARMA, SAA and WEP; MAE selection blending `combine` days for
/// EWMA, Pro-Energy and IPro-Energy; the pool average for D-WCMA, plus the
/// single most similar day for UD-WCMA.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictorSpec {
    Dumb,
    Ewma {
        alpha: f64,
        combine: usize,
    },
    ProEnergy {
        weight: f64,
        correlation: f64,
        combine: usize,
        /// Resample the challenge before forecasting.
        resize: bool,
    },
    IproEnergy {
        weight: f64,
        combine: usize,
    },
    Dwcma,
    Udwcma,
    Arma {
        ar: Vec<f64>,
        ma: Vec<f64>,
    },
    Saa {
        model: SaaModel,
        trig: TrigApprox,
    },
    Wep {
        error_adjustment: bool,
    },
}

impl PredictorSpec {
    /// Predictor name, as reported by the predictor itself.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dumb => "Dumb",
            Self::Ewma { .. } => "EWMA",
            Self::ProEnergy { .. } => "Pro-Energy",
            Self::IproEnergy { .. } => "IPro-Energy",
            Self::Dwcma => "D-WCMA",
            Self::Udwcma => "UD-WCMA",
            Self::Arma { .. } => "ARMA",
            Self::Saa { .. } => "SAA",
            Self::Wep { .. } => "WEP",
        }
    }

    /// Whether the predictor reads a pool of historical traces.
    pub fn uses_pool(&self) -> bool {
        !matches!(
            self,
            Self::Dumb | Self::Arma { .. } | Self::Saa { .. } | Self::Wep { .. }
        )
    }

    pub(crate) fn resizes(&self) -> bool {
        matches!(self, Self::ProEnergy { resize: true, .. })
    }

    /// Check parameters that only make sense together with `config`.
    pub fn validate(&self, config: &EvaluationConfig) -> Result<()> {
        let combine = match self {
            Self::Ewma { combine, .. }
            | Self::ProEnergy { combine, .. }
            | Self::IproEnergy { combine, .. } => Some(*combine),
            _ => None,
        };
        if combine == Some(0) {
            return Err(invalid(format!(
                "{} must combine at least one trace",
                self.name()
            )));
        }
        let needs_history = matches!(
            self,
            Self::ProEnergy { .. } | Self::IproEnergy { .. } | Self::Dwcma | Self::Udwcma
        );
        if needs_history && config.window < 2 {
            return Err(invalid(format!(
                "{} needs a window of at least 2 timeslots, got {}",
                self.name(),
                config.window
            )));
        }
        if let Self::Arma { ar, .. } = self {
            if ar.is_empty() {
                return Err(invalid("ARMA needs at least one AR coefficient".to_string()));
            }
        }
        Ok(())
    }
}
