//! Forecast evaluation: rolling origins over a challenge trace, forecasts
//! filed per horizon, and accuracy metrics per horizon.

mod config;
mod evaluator;
mod metrics;

pub use config::{EvaluationConfig, PredictorSpec};
pub use evaluator::{EvaluationReport, Evaluator, ForecastPoint, HorizonReport};
pub use metrics::{horizon_metrics, HorizonMetrics};
