//! # harvest-forecast
//!
//! Energy-harvesting availability forecasting from historical traces.
//!
//! Given a challenge trace (the day being forecast) and a pool of past
//! traces, an [`analyzers::Analyzer`] picks or synthesizes a reference
//! series, a [`predictors::Predictor`] forecasts the challenge from it, and
//! the [`evaluation`] module scores those forecasts per horizon. Solar
//! traces carry their location so predictors can follow the sun.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod analyzers;
pub mod core;
pub mod error;
pub mod evaluation;
pub mod predictors;
pub mod trig;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::analyzers::{Analyzer, AverageAnalyzer, MaeAnalyzer, RandomAnalyzer, VoidAnalyzer};
    pub use crate::core::{Location, Sample, SolarTimeSeries, TimeSeries, TraceLoader, ValueMode};
    pub use crate::error::{ForecastError, Result};
    pub use crate::evaluation::{EvaluationConfig, Evaluator, PredictorSpec};
    pub use crate::predictors::Predictor;
    pub use crate::trig::TrigApprox;
}
