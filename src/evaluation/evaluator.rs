//! Rolling-origin evaluation of a predictor against a challenge trace.

use super::config::{EvaluationConfig, PredictorSpec};
use super::metrics::{HorizonMetrics, MetricsAccumulator};
use crate::analyzers::{Analyzer, AverageAnalyzer, MaeAnalyzer, VoidAnalyzer, WeightingFactors};
use crate::core::{SolarTimeSeries, TimeSeries, Timeslot};
use crate::error::{ForecastError, Result};
use crate::predictors::{
    ArmaPredictor, BoxedPredictor, DumbPredictor, DwcmaPredictor, EwmaPredictor,
    IproEnergyPredictor, ProEnergyPredictor, SaaPredictor, UdwcmaPredictor, WepPredictor,
};
use std::borrow::Cow;
use std::fmt;
use tracing::{debug, info, warn};

/// Share of the largest actual value below which percentage errors are not
/// scored.
const MAPE_THRESHOLD_RATIO: f64 = 0.1;

/// One forecast and the value it was scored against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub timeslot: Timeslot,
    pub actual: f64,
    pub predicted: f64,
}

/// Forecasts made `horizon` timeslots ahead of their origin.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonReport {
    pub horizon: Timeslot,
    pub points: Vec<ForecastPoint>,
    /// None when no origin reached this horizon.
    pub metrics: Option<HorizonMetrics>,
}

/// Outcome of an evaluation run.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    /// Number of historical traces the analyzer accepted.
    pub pool_size: usize,
    pub horizons: Vec<HorizonReport>,
}

impl EvaluationReport {
    pub fn horizon(&self, horizon: Timeslot) -> Option<&HorizonReport> {
        self.horizons.iter().find(|h| h.horizon == horizon)
    }
}

fn fmt_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"))
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trace pool size: {}", self.pool_size)?;
        for report in &self.horizons {
            match &report.metrics {
                Some(m) => writeln!(
                    f,
                    "Horizon: {} MAE: {:.3} MAPE: {} RMSE: {:.3} MASE: {} MADP: {} ({} forecasts)",
                    report.horizon,
                    m.mae,
                    fmt_optional(m.mape),
                    m.rmse,
                    fmt_optional(m.mase),
                    fmt_optional(m.madp),
                    m.count
                )?,
                None => writeln!(f, "Horizon: {} no forecasts", report.horizon)?,
            }
        }
        Ok(())
    }
}

/// The analyzers a predictor reads its reference from.
enum Pairing<'p> {
    Void(VoidAnalyzer<'p>),
    Mae(MaeAnalyzer<'p>),
    Average(AverageAnalyzer<'p>),
    AverageWithSimilar(AverageAnalyzer<'p>, MaeAnalyzer<'p>),
}

impl<'p> Pairing<'p> {
    fn for_spec(spec: &PredictorSpec) -> Self {
        match spec {
            PredictorSpec::Ewma { combine, .. }
            | PredictorSpec::ProEnergy { combine, .. }
            | PredictorSpec::IproEnergy { combine, .. } => Self::Mae(MaeAnalyzer::new(*combine)),
            PredictorSpec::Dwcma => Self::Average(AverageAnalyzer::new()),
            PredictorSpec::Udwcma => {
                Self::AverageWithSimilar(AverageAnalyzer::new(), MaeAnalyzer::new(1))
            }
            PredictorSpec::Dumb
            | PredictorSpec::Arma { .. }
            | PredictorSpec::Saa { .. }
            | PredictorSpec::Wep { .. } => Self::Void(VoidAnalyzer::new()),
        }
    }

    fn primary(&mut self) -> &mut dyn Analyzer<'p> {
        match self {
            Self::Void(a) => a,
            Self::Mae(a) => a,
            Self::Average(a) | Self::AverageWithSimilar(a, _) => a,
        }
    }

    fn add_series(&mut self, series: &'p TimeSeries) -> bool {
        match self {
            Self::AverageWithSimilar(average, similar) => {
                average.add_series(series) && similar.add_series(series)
            }
            _ => self.primary().add_series(series),
        }
    }

    fn pool_size(&mut self) -> usize {
        self.primary().pool_size()
    }

    fn similar(
        &mut self,
        target: &TimeSeries,
        origin: Timeslot,
        window: usize,
    ) -> Result<Option<Cow<'p, TimeSeries>>> {
        match self {
            Self::AverageWithSimilar(_, similar) => {
                similar.select_reference(target, origin, window).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn factors(&self) -> Option<&WeightingFactors> {
        match self {
            Self::Average(a) | Self::AverageWithSimilar(a, _) => a.factors(),
            _ => None,
        }
    }
}

/// Everything a predictor may be built from at one origin.
struct Inputs<'b> {
    current: &'b TimeSeries,
    solar: Option<&'b SolarTimeSeries>,
    reference: &'b TimeSeries,
    similar: Option<&'b TimeSeries>,
    factors: Option<&'b WeightingFactors>,
    origin: Timeslot,
    window: usize,
}

fn missing(what: &str) -> ForecastError {
    ForecastError::Computation(format!("analyzer produced no {what}"))
}

/// Drives analyzers and a predictor over every origin of a challenge and
/// scores the forecasts per horizon.
///
/// # Example
/// ```
/// use harvest_forecast::core::{TimeSeries, ValueMode};
/// use harvest_forecast::evaluation::{EvaluationConfig, Evaluator, PredictorSpec};
///
/// let challenge =
///     TimeSeries::from_values("today", ValueMode::Power, 1, &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// let config = EvaluationConfig::new(1, 5).with_horizon(2, 1);
/// let report = Evaluator::new(config, PredictorSpec::Dumb)
///     .unwrap()
///     .run(&challenge, &[])
///     .unwrap();
/// assert_eq!(report.horizons.len(), 2);
/// // origins 1..=4 each forecast one step ahead, always off by one
/// assert_eq!(report.horizons[0].metrics.as_ref().unwrap().mae, 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: EvaluationConfig,
    spec: PredictorSpec,
}

impl Evaluator {
    /// Validate the settings and create an evaluator.
    pub fn new(config: EvaluationConfig, spec: PredictorSpec) -> Result<Self> {
        config.validate()?;
        spec.validate(&config)?;
        Ok(Self { config, spec })
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn spec(&self) -> &PredictorSpec {
        &self.spec
    }

    /// Evaluate against a plain challenge trace.
    ///
    /// With origin and final timeslot both 0 the whole trace is evaluated.
    /// SAA needs solar metadata and is rejected here.
    pub fn run(&self, challenge: &TimeSeries, pool: &[TimeSeries]) -> Result<EvaluationReport> {
        if matches!(self.spec, PredictorSpec::Saa { .. }) {
            return Err(ForecastError::InvalidParameter(
                "SAA needs a solar challenge".to_string(),
            ));
        }
        let (origin, final_slot) = if self.config.origin == 0 && self.config.final_slot == 0 {
            let last = challenge.last_timeslot().ok_or(ForecastError::EmptyData)?;
            (0, last)
        } else {
            (self.config.origin, self.config.final_slot)
        };
        self.evaluate(challenge, None, pool, origin, final_slot)
    }

    /// Evaluate against a solar challenge trace.
    ///
    /// With origin and final timeslot both 0 the range runs from the slot
    /// after sunrise to sunset, rounded to the timeslot step.
    pub fn run_solar(
        &self,
        challenge: &SolarTimeSeries,
        pool: &[TimeSeries],
    ) -> Result<EvaluationReport> {
        let (origin, final_slot) = if self.config.origin == 0 && self.config.final_slot == 0 {
            let step = self.config.slot_step;
            let round = |slot: Timeslot| (slot as f64 / step as f64).round() as Timeslot;
            let origin = step * (round(challenge.sunrise_timeslot()?) + 1);
            let final_slot = step * round(challenge.sunset_timeslot()?);
            if final_slot < origin + self.config.horizon {
                return Err(ForecastError::InvalidParameter(format!(
                    "daylight range [{origin}, {final_slot}) cannot hold a horizon of {}",
                    self.config.horizon
                )));
            }
            (origin, final_slot)
        } else {
            (self.config.origin, self.config.final_slot)
        };
        self.evaluate(challenge.series(), Some(challenge), pool, origin, final_slot)
    }

    fn evaluate(
        &self,
        challenge: &TimeSeries,
        solar: Option<&SolarTimeSeries>,
        pool: &[TimeSeries],
        origin: Timeslot,
        final_slot: Timeslot,
    ) -> Result<EvaluationReport> {
        if challenge.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        let config = &self.config;
        let step = config.effective_prediction_step();

        let resized;
        let working = if self.spec.resizes() {
            let mut copy = challenge.clone();
            copy.resize();
            resized = copy;
            &resized
        } else {
            challenge
        };

        let mut pairing = Pairing::for_spec(&self.spec);
        if self.spec.uses_pool() {
            for series in pool {
                if !pairing.add_series(series) {
                    warn!(label = %series.label(), "trace rejected from pool");
                }
            }
        }
        let pool_size = pairing.pool_size();
        info!(
            predictor = self.spec.name(),
            challenge = %challenge.label(),
            pool_size,
            origin,
            final_slot,
            horizon = config.horizon,
            accumulated = config.accumulated,
            "starting evaluation"
        );

        let horizon_count = config.horizon_count();
        let mut buckets: Vec<Vec<ForecastPoint>> = vec![Vec::new(); horizon_count];
        let mut metrics: Vec<MetricsAccumulator> = vec![MetricsAccumulator::default(); horizon_count];
        let power_factor = challenge.day_power_factor();
        let default_threshold = MAPE_THRESHOLD_RATIO * working.max_sample().map_or(0.0, |s| s.value());

        let mut t = origin;
        while t < final_slot {
            let reference = pairing.primary().select_reference(working, t, config.window)?;
            let similar = pairing.similar(working, t, config.window)?;
            let inputs = Inputs {
                current: working,
                solar,
                reference: &reference,
                similar: similar.as_deref(),
                factors: pairing.factors(),
                origin: t,
                window: config.window,
            };
            let mut predictor = self.predictor(inputs)?;
            let horizon_slot = (t + config.horizon).min(final_slot);
            let forecast = predictor.predictions(t, horizon_slot, step)?;
            debug!(
                origin = t,
                reference = %reference.label(),
                forecasts = forecast.len() - 1,
                "forecast origin"
            );

            if config.accumulated {
                let targets: Vec<Timeslot> =
                    forecast.samples().iter().skip(1).map(|s| s.timeslot()).collect();
                let actual: Vec<f64> = targets
                    .iter()
                    .map(|&h| challenge.energy_harvested(t, h, power_factor))
                    .collect();
                let threshold =
                    MAPE_THRESHOLD_RATIO * actual.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                for (i, (&h, &a)) in targets.iter().zip(&actual).enumerate() {
                    let predicted = forecast.energy_harvested(t, h, power_factor);
                    file(&mut buckets, &mut metrics, i, h, a, predicted, threshold);
                }
            } else {
                for (i, sample) in forecast.samples().iter().skip(1).enumerate() {
                    let actual = working.value_at(sample.timeslot()).value();
                    file(
                        &mut buckets,
                        &mut metrics,
                        i,
                        sample.timeslot(),
                        actual,
                        sample.value(),
                        default_threshold,
                    );
                }
            }
            t += config.slot_step;
        }

        let horizons = buckets
            .into_iter()
            .zip(metrics)
            .enumerate()
            .map(|(i, (points, accumulator))| {
                let horizon = (i as Timeslot + 1) * step;
                let metrics = accumulator.finish();
                if metrics.is_none() {
                    warn!(horizon, "no forecasts reached this horizon");
                }
                HorizonReport {
                    horizon,
                    points,
                    metrics,
                }
            })
            .collect();

        info!(predictor = self.spec.name(), "evaluation finished");
        Ok(EvaluationReport {
            pool_size,
            horizons,
        })
    }

    fn predictor<'b>(&self, inputs: Inputs<'b>) -> Result<BoxedPredictor<'b>> {
        let Inputs {
            current,
            solar,
            reference,
            similar,
            factors,
            origin,
            window,
        } = inputs;
        let predictor: BoxedPredictor<'b> = match &self.spec {
            PredictorSpec::Dumb => Box::new(DumbPredictor::new(current, reference)),
            PredictorSpec::Ewma { alpha, .. } => {
                Box::new(EwmaPredictor::new(current, reference, *alpha)?)
            }
            PredictorSpec::ProEnergy {
                weight,
                correlation,
                ..
            } => Box::new(ProEnergyPredictor::new(
                current,
                reference,
                *weight,
                *correlation,
            )?),
            PredictorSpec::IproEnergy { weight, .. } => {
                Box::new(IproEnergyPredictor::new(current, reference, *weight)?)
            }
            PredictorSpec::Dwcma => {
                let factors = factors.ok_or_else(|| missing("weighting factors"))?;
                Box::new(DwcmaPredictor::new(
                    current, reference, factors, origin, window,
                )?)
            }
            PredictorSpec::Udwcma => {
                let factors = factors.ok_or_else(|| missing("weighting factors"))?;
                let similar = similar.ok_or_else(|| missing("similar day"))?;
                Box::new(UdwcmaPredictor::new(
                    current, reference, similar, factors, origin, window,
                )?)
            }
            PredictorSpec::Arma { ar, ma } => Box::new(ArmaPredictor::new(
                current,
                reference,
                ar.clone(),
                ma.clone(),
            )?),
            PredictorSpec::Saa { model, trig } => {
                let solar = solar.ok_or_else(|| {
                    ForecastError::InvalidParameter("SAA needs a solar challenge".to_string())
                })?;
                Box::new(SaaPredictor::new(solar, reference, *model, *trig)?)
            }
            PredictorSpec::Wep { error_adjustment } => Box::new(
                WepPredictor::new(current, reference, window)?
                    .with_error_adjustment(*error_adjustment),
            ),
        };
        Ok(predictor)
    }
}

fn file(
    buckets: &mut [Vec<ForecastPoint>],
    metrics: &mut [MetricsAccumulator],
    index: usize,
    timeslot: Timeslot,
    actual: f64,
    predicted: f64,
    mape_threshold: f64,
) {
    let (Some(bucket), Some(accumulator)) = (buckets.get_mut(index), metrics.get_mut(index)) else {
        return;
    };
    bucket.push(ForecastPoint {
        timeslot,
        actual,
        predicted,
    });
    accumulator.push(actual, predicted, mape_threshold);
}
