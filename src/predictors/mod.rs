//! Forecasting strategies.
//!
//! A predictor is bound to the series being forecast (`current`) and to the
//! reference chosen by an analyzer. Every variant answers the same question:
//! knowing the current reading at the origin (`init`) and the reference
//! reading at the target timeslot (`past`), what will the current series
//! read at that target?

mod arma;
mod dumb;
mod ewma;
mod ipro_energy;
mod pro_energy;
mod saa;
mod wcma;
mod wep;

pub use arma::ArmaPredictor;
pub use dumb::DumbPredictor;
pub use ewma::EwmaPredictor;
pub use ipro_energy::IproEnergyPredictor;
pub use pro_energy::ProEnergyPredictor;
pub use saa::{SaaModel, SaaPredictor};
pub use wcma::{DwcmaPredictor, GapFactor, UdwcmaPredictor};
pub use wep::WepPredictor;

use crate::core::{Sample, TimeSeries, Timeslot};
use crate::error::{ForecastError, Result};

/// Common interface for all predictors.
///
/// This trait is object-safe and can be used with `Box<dyn Predictor>`.
pub trait Predictor {
    /// The series being forecast.
    fn current(&self) -> &TimeSeries;

    /// The reference series selected by an analyzer.
    fn reference(&self) -> &TimeSeries;

    /// Forecast the value at `past.timeslot()` from the reading at the origin.
    fn predict(&mut self, init: &Sample, past: &Sample) -> f64;

    /// Predictor name.
    fn name(&self) -> &str;

    /// Forecast every `step` timeslots from `origin` up to `final_slot`.
    ///
    /// The first sample is an explicit 0 at `origin`; each following sample
    /// is `predict(current.value_at(origin), reference.value_at(t))`.
    fn predictions(
        &mut self,
        origin: Timeslot,
        final_slot: Timeslot,
        step: Timeslot,
    ) -> Result<TimeSeries> {
        if step <= 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "prediction step must be positive, got {step}"
            )));
        }
        let init = self.current().value_at(origin);
        let mut forecast = self.current().derived(format!("{origin}.predictions"));
        forecast.append(0.0, origin)?;
        let mut timeslot = origin + step;
        while timeslot <= final_slot {
            let past = self.reference().value_at(timeslot);
            let value = self.predict(&init, &past);
            forecast.append(value, timeslot)?;
            timeslot += step;
        }
        Ok(forecast)
    }
}

/// Type alias for boxed predictor trait objects.
pub type BoxedPredictor<'a> = Box<dyn Predictor + 'a>;

pub(crate) fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ForecastError::InvalidParameter(format!(
            "{name} must be in [0, 1], got {value}"
        )));
    }
    Ok(())
}

pub(crate) fn check_window(window: usize) -> Result<()> {
    if window == 0 {
        return Err(ForecastError::InvalidParameter(
            "window must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ValueMode;

    fn series(values: &[f64]) -> TimeSeries {
        TimeSeries::from_values("s", ValueMode::Power, 10, values).unwrap()
    }

    #[test]
    fn predictions_start_with_zero_at_origin() {
        let current = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let reference = series(&[9.0; 5]);
        let mut predictor = DumbPredictor::new(&current, &reference);
        let forecast = predictor.predictions(20, 50, 10).unwrap();
        let timeslots: Vec<_> = forecast.samples().iter().map(|s| s.timeslot()).collect();
        assert_eq!(timeslots, vec![20, 30, 40, 50]);
        assert_eq!(forecast.values(), vec![0.0, 2.0, 2.0, 2.0]);
        assert_eq!(forecast.label(), "20.predictions");
    }

    #[test]
    fn predictions_stop_at_final_slot() {
        let current = series(&[1.0, 2.0, 3.0]);
        let reference = series(&[1.0, 2.0, 3.0]);
        let mut predictor = DumbPredictor::new(&current, &reference);
        let forecast = predictor.predictions(10, 35, 10).unwrap();
        assert_eq!(forecast.len(), 3);
        let only_origin = predictor.predictions(10, 10, 10).unwrap();
        assert_eq!(only_origin.len(), 1);
    }

    #[test]
    fn step_must_be_positive() {
        let current = series(&[1.0]);
        let mut predictor = DumbPredictor::new(&current, &current);
        assert!(predictor.predictions(10, 20, 0).is_err());
    }

    #[test]
    fn boxed_predictors_share_the_contract() {
        let current = series(&[1.0, 2.0, 3.0, 4.0]);
        let reference = series(&[2.0, 2.0, 2.0, 2.0]);
        let mut predictors: Vec<BoxedPredictor<'_>> = vec![
            Box::new(DumbPredictor::new(&current, &reference)),
            Box::new(EwmaPredictor::new(&current, &reference, 0.5).unwrap()),
            Box::new(ProEnergyPredictor::new(&current, &reference, 0.5, 0.0).unwrap()),
            Box::new(IproEnergyPredictor::new(&current, &reference, 0.5).unwrap()),
            Box::new(WepPredictor::new(&current, &reference, 2).unwrap()),
            Box::new(ArmaPredictor::new(&current, &reference, vec![1.0], vec![]).unwrap()),
        ];
        for predictor in predictors.iter_mut() {
            let forecast = predictor.predictions(20, 40, 10).unwrap();
            assert_eq!(forecast.len(), 3, "{}", predictor.name());
            assert!(forecast.values().iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn parameter_checks() {
        assert!(check_unit_interval("alpha", 0.0).is_ok());
        assert!(check_unit_interval("alpha", 1.0).is_ok());
        assert!(check_unit_interval("alpha", 1.5).is_err());
        assert!(check_unit_interval("alpha", f64::NAN).is_err());
        assert!(check_window(0).is_err());
        assert!(check_window(1).is_ok());
    }
}
