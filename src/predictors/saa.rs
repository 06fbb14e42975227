//! Solar altitude angle (SAA) predictor.
//!
//! Scales the origin reading by the ratio of a solar elevation proxy at the
//! target and at the origin. Two models are available:
//!
//! - [`SaaModel::Sine`]: a half-sine between sunrise and sunset.
//! - [`SaaModel::Altitude`]: the actual elevation angle from latitude,
//!   declination and hour angle.
//!
//! Both evaluate their trigonometry through a [`TrigApprox`].

use super::Predictor;
use crate::core::{Sample, SolarTimeSeries, TimeSeries, Timeslot};
use crate::error::{ForecastError, Result};
use crate::trig::TrigApprox;
use chrono::Datelike;
use std::f32::consts::PI;
use tracing::debug;

/// Origin angles at or below this are treated as night.
const NIGHT_THRESHOLD: f32 = 1e-4;

/// Peak solar declination in radians (23.45 degrees).
const MAX_DECLINATION: f32 = 0.409_279_7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaaModel {
    /// `sin(π (t - sunrise) / (sunset - sunrise))`.
    #[default]
    Sine,
    /// Spherical-trigonometry solar altitude.
    Altitude,
}

/// Solar altitude angle predictor bound to a [`SolarTimeSeries`].
///
/// Sunrise, sunset, noon and the day's solar constants are resolved once at
/// construction. Negative predictions clamp to 0.
#[derive(Debug, Clone)]
pub struct SaaPredictor<'a> {
    current: &'a SolarTimeSeries,
    reference: &'a TimeSeries,
    model: SaaModel,
    trig: TrigApprox,
    sunrise: Timeslot,
    sunset: Timeslot,
    noon: Timeslot,
    hour_factor: f32,
    sin_latitude: f32,
    cos_latitude: f32,
    sin_declination: f32,
    cos_declination: f32,
}

impl<'a> SaaPredictor<'a> {
    pub fn new(
        current: &'a SolarTimeSeries,
        reference: &'a TimeSeries,
        model: SaaModel,
        trig: TrigApprox,
    ) -> Result<Self> {
        let sunrise = current.sunrise_timeslot()?;
        let sunset = current.sunset_timeslot()?;
        if sunset <= sunrise {
            return Err(ForecastError::Computation(format!(
                "sunset timeslot {sunset} does not follow sunrise timeslot {sunrise}"
            )));
        }
        let noon = current.noon_timeslot()?;
        let last = current.last_timeslot().ok_or(ForecastError::EmptyData)?;
        let day_of_year = current.date().ok_or(ForecastError::MissingDate)?.ordinal();

        let latitude = current.latitude() as f32 * PI / 180.0;
        let declination =
            -MAX_DECLINATION * trig.cos((day_of_year + 10) as f32 * 2.0 * PI / 365.0);
        debug!(
            label = %current.label(),
            sunrise,
            sunset,
            noon,
            day_of_year,
            declination,
            model = ?model,
            "SAA solar constants"
        );

        Ok(Self {
            current,
            reference,
            model,
            trig,
            sunrise,
            sunset,
            noon,
            hour_factor: 24.0 / last as f32,
            sin_latitude: trig.sin(latitude),
            cos_latitude: trig.cos(latitude),
            sin_declination: trig.sin(declination),
            cos_declination: trig.cos(declination),
        })
    }

    pub fn model(&self) -> SaaModel {
        self.model
    }

    pub fn sunrise(&self) -> Timeslot {
        self.sunrise
    }

    pub fn sunset(&self) -> Timeslot {
        self.sunset
    }

    pub fn noon(&self) -> Timeslot {
        self.noon
    }

    fn angle(&self, timeslot: Timeslot) -> f32 {
        match self.model {
            SaaModel::Sine => self.day_phase(timeslot),
            SaaModel::Altitude => self.altitude(timeslot),
        }
    }

    fn day_phase(&self, timeslot: Timeslot) -> f32 {
        let fraction = (timeslot - self.sunrise) as f32 / (self.sunset - self.sunrise) as f32;
        self.trig.sin(PI * fraction)
    }

    fn altitude(&self, timeslot: Timeslot) -> f32 {
        let hour_angle = PI / 12.0 * (timeslot - self.noon) as f32 * self.hour_factor;
        self.trig.asin(
            self.sin_declination * self.sin_latitude
                + self.cos_declination * self.cos_latitude * self.trig.cos(hour_angle),
        )
    }
}

impl Predictor for SaaPredictor<'_> {
    fn current(&self) -> &TimeSeries {
        self.current.series()
    }

    fn reference(&self) -> &TimeSeries {
        self.reference
    }

    fn predict(&mut self, init: &Sample, past: &Sample) -> f64 {
        let at_origin = self.angle(init.timeslot());
        if at_origin.is_nan() || at_origin <= NIGHT_THRESHOLD {
            return 0.0;
        }
        let at_target = self.angle(past.timeslot());
        let prediction = init.value() * f64::from(at_target / at_origin);
        prediction.max(0.0)
    }

    fn name(&self) -> &str {
        "SAA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Location, SolarGeometry, SunTimes, ValueMode};
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::rc::Rc;

    #[derive(Debug)]
    struct FixedSun(SunTimes);

    impl SolarGeometry for FixedSun {
        fn sun_times(&self, _: NaiveDate, _: f64, _: f64) -> Result<SunTimes> {
            Ok(self.0)
        }
    }

    fn solar_day(rise_hour: u32, set_hour: u32) -> SolarTimeSeries {
        let times = SunTimes {
            sunrise: Utc.with_ymd_and_hms(2024, 3, 20, rise_hour, 0, 0).unwrap(),
            sunset: Utc.with_ymd_and_hms(2024, 3, 20, set_hour, 0, 0).unwrap(),
        };
        let series = TimeSeries::from_values("20240320.trace", ValueMode::Power, 1, &[0.0; 24])
            .unwrap()
            .with_date(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        SolarTimeSeries::new(series, Location::new(0.0, 0.0).unwrap())
            .with_geometry(Rc::new(FixedSun(times)))
    }

    #[test]
    fn sine_model_scales_by_day_phase() {
        let day = solar_day(0, 20);
        let mut predictor =
            SaaPredictor::new(&day, day.series(), SaaModel::Sine, TrigApprox::exact()).unwrap();
        assert_eq!((predictor.sunrise(), predictor.sunset()), (0, 20));
        let value = predictor.predict(&Sample::new(100.0, 10), &Sample::new(0.0, 5));
        assert!((value - 70.71).abs() < 0.01, "got {value}");
    }

    #[test]
    fn approximate_trig_stays_close() {
        let day = solar_day(0, 20);
        let init = Sample::new(100.0, 10);
        let past = Sample::new(0.0, 5);
        for trig in [TrigApprox::taylor(7), TrigApprox::chebyshev(7)] {
            let mut predictor = SaaPredictor::new(&day, day.series(), SaaModel::Sine, trig).unwrap();
            let value = predictor.predict(&init, &past);
            assert!((value - 70.71).abs() < 0.1, "{trig:?} gave {value}");
        }
    }

    #[test]
    fn night_origin_predicts_zero() {
        let day = solar_day(6, 18);
        let mut predictor =
            SaaPredictor::new(&day, day.series(), SaaModel::Sine, TrigApprox::exact()).unwrap();
        assert_eq!(predictor.predict(&Sample::new(5.0, 6), &Sample::new(0.0, 12)), 0.0);
        assert_eq!(predictor.predict(&Sample::new(5.0, 3), &Sample::new(0.0, 12)), 0.0);
        // target after sunset clamps to 0
        assert_eq!(predictor.predict(&Sample::new(5.0, 12), &Sample::new(0.0, 20)), 0.0);
    }

    #[test]
    fn altitude_model_peaks_at_noon() {
        let day = solar_day(6, 18);
        let mut predictor =
            SaaPredictor::new(&day, day.series(), SaaModel::Altitude, TrigApprox::exact())
                .unwrap();
        assert_eq!(predictor.noon(), 12);
        let init = Sample::new(100.0, 12);
        let noon = predictor.predict(&init, &Sample::new(0.0, 12));
        assert!((noon - 100.0).abs() < 1e-9);
        let before = predictor.predict(&init, &Sample::new(0.0, 9));
        let after = predictor.predict(&init, &Sample::new(0.0, 15));
        assert!(before > 0.0 && before < 100.0);
        assert!((before - after).abs() < 1e-3);
        let horizon = predictor.predict(&init, &Sample::new(0.0, 6));
        assert!(horizon.abs() < 1e-3);
    }

    #[test]
    fn altitude_model_is_zero_before_sunrise() {
        let day = solar_day(6, 18);
        let mut predictor =
            SaaPredictor::new(&day, day.series(), SaaModel::Altitude, TrigApprox::exact())
                .unwrap();
        assert_eq!(predictor.predict(&Sample::new(3.0, 4), &Sample::new(0.0, 12)), 0.0);
    }

    #[test]
    fn inverted_sun_times_are_rejected() {
        let day = solar_day(18, 6);
        let result = SaaPredictor::new(&day, day.series(), SaaModel::Sine, TrigApprox::exact());
        assert!(matches!(result, Err(ForecastError::Computation(_))));
    }
}
