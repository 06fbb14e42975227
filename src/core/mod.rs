//! Core data structures: samples, time series, solar metadata and trace loading.

mod solar;
mod time_series;
mod trace;

pub use solar::{Location, SolarGeometry, SolarTimeSeries, SunTimes, SunriseEquation};
pub use time_series::{Sample, TimeSeries, ValueMode};
pub use trace::TraceLoader;

/// Discrete time index within a trace.
///
/// Signed so that offsets before the first sample stay representable.
pub type Timeslot = i64;

/// Number of seconds in a day, used to map instants and power rates onto timeslots.
pub const SECONDS_PER_DAY: i64 = 86_400;
