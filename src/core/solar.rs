//! Solar traces: location metadata and cached sunrise, sunset and noon timeslots.

use super::{TimeSeries, Timeslot, SECONDS_PER_DAY};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Timelike, Utc};
use std::cell::OnceCell;
use std::f64::consts::TAU;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;
use tracing::debug;

/// Julian date of the Unix epoch.
const UNIX_EPOCH_JULIAN: f64 = 2_440_587.5;

/// Julian date of the J2000 epoch.
const J2000: f64 = 2_451_545.0;

/// Values above this are treated as daylight by the data-driven estimates.
const DAYLIGHT_THRESHOLD: f64 = 0.1;

/// Geographic position of a trace, with the UTC offset its timeslots are
/// expressed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    latitude: f64,
    longitude: f64,
    utc_offset: FixedOffset,
}

impl Location {
    /// Create a location in UTC.
    ///
    /// Latitude must lie in [-90, 90] and longitude in [-180, 180] degrees.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ForecastError::InvalidParameter(format!(
                "latitude must be in [-90, 90], got {latitude}"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ForecastError::InvalidParameter(format!(
                "longitude must be in [-180, 180], got {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
            utc_offset: Utc.fix(),
        })
    }

    /// Set the local time offset.
    ///
    /// The offset is fixed: it does not follow daylight saving changes, so a
    /// trace recorded in summer time needs its summer offset here.
    pub fn with_utc_offset(mut self, utc_offset: FixedOffset) -> Self {
        self.utc_offset = utc_offset;
        self
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }
}

/// Sunrise and sunset instants of one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SunTimes {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

/// Source of sunrise and sunset times for a date and position.
pub trait SolarGeometry: fmt::Debug {
    /// Sunrise and sunset (UTC) on `date` at the given coordinates in degrees.
    fn sun_times(&self, date: NaiveDate, latitude: f64, longitude: f64) -> Result<SunTimes>;
}

/// The standard sunrise equation.
///
/// Works from the chronological Julian day number through the solar mean
/// anomaly, equation of the center, ecliptic longitude and transit, with the
/// -0.833° correction for refraction and the solar disc.
///
/// # Example
/// ```
/// use chrono::{NaiveDate, Timelike};
/// use harvest_forecast::core::{SolarGeometry, SunriseEquation};
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
/// let times = SunriseEquation.sun_times(date, 0.0, 0.0).unwrap();
/// assert_eq!(times.sunrise.hour(), 6);
/// assert_eq!(times.sunset.hour(), 18);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SunriseEquation;

impl SunriseEquation {
    /// Chronological Julian day number of a calendar date.
    pub fn julian_day(date: NaiveDate) -> i64 {
        i64::from(date.num_days_from_ce()) + 1_721_425
    }
}

impl SolarGeometry for SunriseEquation {
    fn sun_times(&self, date: NaiveDate, latitude: f64, longitude: f64) -> Result<SunTimes> {
        let mean_noon = Self::julian_day(date) as f64 - J2000 + 0.0008 - longitude / 360.0;
        let anomaly = (357.5291 + 0.985_600_28 * mean_noon).rem_euclid(360.0);
        let m = anomaly.to_radians();
        let center = 1.9148 * m.sin() + 0.02 * (2.0 * m).sin() + 0.0003 * (3.0 * m).sin();
        let ecliptic = (anomaly + center + 282.9372).rem_euclid(360.0).to_radians();
        let transit = J2000 + mean_noon + 0.0053 * m.sin() - 0.0069 * (2.0 * ecliptic).sin();
        let declination = (ecliptic.sin() * 0.397_788_2).asin();

        let lat = latitude.to_radians();
        let cos_hour_angle =
            (-0.014_485_7 - lat.sin() * declination.sin()) / (lat.cos() * declination.cos());
        if !(-1.0..=1.0).contains(&cos_hour_angle) {
            return Err(ForecastError::Computation(format!(
                "the sun does not rise or set on {date} at latitude {latitude}"
            )));
        }
        let half_day = cos_hour_angle.acos() / TAU;

        Ok(SunTimes {
            sunrise: julian_to_utc(transit - half_day)?,
            sunset: julian_to_utc(transit + half_day)?,
        })
    }
}

fn julian_to_utc(julian: f64) -> Result<DateTime<Utc>> {
    let seconds = ((julian - UNIX_EPOCH_JULIAN) * SECONDS_PER_DAY as f64).round() as i64;
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        ForecastError::Computation(format!("julian date {julian} is out of range"))
    })
}

/// A [`TimeSeries`] collected by a solar harvester at a known location.
///
/// Sunrise, sunset and noon are expressed as timeslots of this series: an
/// instant maps to `seconds_of_day_local * last_timeslot / 86400`. They are
/// computed on first use and cached.
///
/// Derefs to the underlying [`TimeSeries`].
#[derive(Debug, Clone)]
pub struct SolarTimeSeries {
    series: TimeSeries,
    location: Location,
    geometry: Rc<dyn SolarGeometry>,
    sun_times: OnceCell<SunTimes>,
    sunrise: OnceCell<Timeslot>,
    sunset: OnceCell<Timeslot>,
    noon: OnceCell<Timeslot>,
}

impl SolarTimeSeries {
    /// Wrap a series, using [`SunriseEquation`] for solar geometry.
    pub fn new(series: TimeSeries, location: Location) -> Self {
        Self {
            series,
            location,
            geometry: Rc::new(SunriseEquation),
            sun_times: OnceCell::new(),
            sunrise: OnceCell::new(),
            sunset: OnceCell::new(),
            noon: OnceCell::new(),
        }
    }

    /// Use another solar geometry source.
    pub fn with_geometry(mut self, geometry: Rc<dyn SolarGeometry>) -> Self {
        self.geometry = geometry;
        self.clear_cache();
        self
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn latitude(&self) -> f64 {
        self.location.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.location.longitude
    }

    /// Resample the underlying series. Cached timeslots are recomputed on next use.
    pub fn resize(&mut self) {
        self.series.resize();
        self.clear_cache();
    }

    fn clear_cache(&mut self) {
        self.sun_times = OnceCell::new();
        self.sunrise = OnceCell::new();
        self.sunset = OnceCell::new();
        self.noon = OnceCell::new();
    }

    /// Sunrise and sunset instants for the collection date.
    pub fn sun_times(&self) -> Result<SunTimes> {
        if let Some(times) = self.sun_times.get() {
            return Ok(*times);
        }
        let date = self.series.date().ok_or(ForecastError::MissingDate)?;
        let times = self
            .geometry
            .sun_times(date, self.location.latitude, self.location.longitude)?;
        debug!(
            label = %self.series.label(),
            %date,
            sunrise = %times.sunrise,
            sunset = %times.sunset,
            "computed sun times"
        );
        Ok(*self.sun_times.get_or_init(|| times))
    }

    fn to_timeslot(&self, instant: DateTime<Utc>) -> Result<Timeslot> {
        let last = self.series.last_timeslot().ok_or(ForecastError::EmptyData)?;
        let local = instant.with_timezone(&self.location.utc_offset);
        let seconds = i64::from(local.num_seconds_from_midnight());
        Ok(seconds * last / SECONDS_PER_DAY)
    }

    pub fn sunrise_timeslot(&self) -> Result<Timeslot> {
        if let Some(slot) = self.sunrise.get() {
            return Ok(*slot);
        }
        let slot = self.to_timeslot(self.sun_times()?.sunrise)?;
        Ok(*self.sunrise.get_or_init(|| slot))
    }

    pub fn sunset_timeslot(&self) -> Result<Timeslot> {
        if let Some(slot) = self.sunset.get() {
            return Ok(*slot);
        }
        let slot = self.to_timeslot(self.sun_times()?.sunset)?;
        Ok(*self.sunset.get_or_init(|| slot))
    }

    /// Midpoint of sunrise and sunset.
    pub fn noon_timeslot(&self) -> Result<Timeslot> {
        if let Some(slot) = self.noon.get() {
            return Ok(*slot);
        }
        let slot = (self.sunrise_timeslot()? + self.sunset_timeslot()?) / 2;
        Ok(*self.noon.get_or_init(|| slot))
    }

    /// Timeslot of the sample preceding the first daylight value.
    ///
    /// Needs no location: it reads the data. Falls back to the last sample
    /// when the trace never rises above the daylight threshold.
    pub fn estimated_sunrise_timeslot(&self) -> Result<Timeslot> {
        estimate_edge(self.series.samples().iter().map(|s| (s.value(), s.timeslot())))
    }

    /// Timeslot of the sample following the last daylight value.
    pub fn estimated_sunset_timeslot(&self) -> Result<Timeslot> {
        estimate_edge(
            self.series
                .samples()
                .iter()
                .rev()
                .map(|s| (s.value(), s.timeslot())),
        )
    }
}

fn estimate_edge(samples: impl Iterator<Item = (f64, Timeslot)>) -> Result<Timeslot> {
    let mut previous = None;
    for (value, timeslot) in samples {
        if value > DAYLIGHT_THRESHOLD {
            return Ok(previous.unwrap_or(timeslot));
        }
        previous = Some(timeslot);
    }
    previous.ok_or(ForecastError::EmptyData)
}

impl Deref for SolarTimeSeries {
    type Target = TimeSeries;

    fn deref(&self) -> &TimeSeries {
        &self.series
    }
}

impl AsRef<TimeSeries> for SolarTimeSeries {
    fn as_ref(&self) -> &TimeSeries {
        &self.series
    }
}
