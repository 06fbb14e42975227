//! End-to-end evaluation over synthetic solar days.
//!
//! Days are 48 half-hour slots with a half-sine production curve between
//! 06:00 and 18:00 UTC, scaled by a per-day peak.

use approx::assert_relative_eq;
use chrono::{NaiveDate, TimeZone, Utc};
use harvest_forecast::core::{
    Location, SolarGeometry, SolarTimeSeries, SunTimes, TimeSeries, Timeslot, TraceLoader,
    ValueMode,
};
use harvest_forecast::evaluation::{EvaluationConfig, Evaluator, PredictorSpec};
use harvest_forecast::predictors::SaaModel;
use harvest_forecast::trig::TrigApprox;
use harvest_forecast::{ForecastError, Result};
use std::f64::consts::PI;
use std::fs;
use std::rc::Rc;

const SLOTS: usize = 48;
const SUNRISE_SLOT: f64 = 12.0;
const SUNSET_SLOT: f64 = 36.0;

#[derive(Debug)]
struct SixToSix;

impl SolarGeometry for SixToSix {
    fn sun_times(&self, date: NaiveDate, _: f64, _: f64) -> Result<SunTimes> {
        let at = |hour| {
            Utc.from_utc_datetime(&date.and_hms_opt(hour, 0, 0).unwrap())
        };
        Ok(SunTimes {
            sunrise: at(6),
            sunset: at(18),
        })
    }
}

fn production(peak: f64) -> Vec<f64> {
    (1..=SLOTS)
        .map(|t| {
            let phase = (t as f64 - SUNRISE_SLOT) / (SUNSET_SLOT - SUNRISE_SLOT);
            (peak * (PI * phase).sin()).max(0.0)
        })
        .collect()
}

fn day(date: NaiveDate, peak: f64) -> TimeSeries {
    let label = format!("{}.trace", date.format("%Y%m%d"));
    TimeSeries::from_values(label, ValueMode::Power, 1, &production(peak))
        .unwrap()
        .with_date(date)
}

fn june(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn challenge(peak: f64) -> SolarTimeSeries {
    SolarTimeSeries::new(day(june(21), peak), Location::new(0.0, 0.0).unwrap())
        .with_geometry(Rc::new(SixToSix))
}

fn pool() -> Vec<TimeSeries> {
    [(17, 80.0), (18, 95.0), (19, 60.0), (20, 100.0)]
        .into_iter()
        .map(|(d, peak)| day(june(d), peak))
        .collect()
}

#[test]
fn daylight_range_is_derived_from_the_sun() {
    let challenge = challenge(90.0);
    let config = EvaluationConfig::default().with_horizon(4, 1);
    let report = Evaluator::new(config, PredictorSpec::Dumb)
        .unwrap()
        .run_solar(&challenge, &[])
        .unwrap();

    // origins 13..36, the first forecast lands one slot later
    let first = &report.horizons[0].points;
    assert_eq!(first.first().unwrap().timeslot, 14);
    assert_eq!(first.last().unwrap().timeslot, 36);
    assert_eq!(first.len(), 23);
    assert!(report
        .horizons
        .iter()
        .flat_map(|h| &h.points)
        .all(|p| p.timeslot <= 36));
}

#[test]
fn sine_model_tracks_a_clear_day() {
    let challenge = challenge(90.0);
    let config = EvaluationConfig::default().with_horizon(6, 1);
    let spec = PredictorSpec::Saa {
        model: SaaModel::Sine,
        trig: TrigApprox::exact(),
    };
    let report = Evaluator::new(config, spec)
        .unwrap()
        .run_solar(&challenge, &[])
        .unwrap();
    for horizon in &report.horizons {
        let metrics = horizon.metrics.as_ref().unwrap();
        assert!(metrics.mae < 0.01, "horizon {}: {metrics:?}", horizon.horizon);
    }
}

#[test]
fn dumb_error_grows_with_the_horizon() {
    let challenge = challenge(90.0);
    let config = EvaluationConfig::new(13, 24).with_horizon(6, 2);
    let report = Evaluator::new(config, PredictorSpec::Dumb)
        .unwrap()
        .run_solar(&challenge, &[])
        .unwrap();
    let maes: Vec<f64> = report
        .horizons
        .iter()
        .map(|h| h.metrics.as_ref().unwrap().mae)
        .collect();
    assert_eq!(report.horizons.len(), 3);
    // the morning ramp keeps rising, so waiting longer costs more
    assert!(maes.windows(2).all(|w| w[0] < w[1]), "{maes:?}");
}

#[test]
fn every_predictor_runs_against_a_pool() {
    let challenge = challenge(90.0);
    let pool = pool();
    let specs = vec![
        PredictorSpec::Dumb,
        PredictorSpec::Ewma {
            alpha: 0.5,
            combine: 2,
        },
        PredictorSpec::ProEnergy {
            weight: 0.5,
            correlation: 4.0,
            combine: 2,
            resize: false,
        },
        PredictorSpec::ProEnergy {
            weight: 0.5,
            correlation: 0.0,
            combine: 1,
            resize: true,
        },
        PredictorSpec::IproEnergy {
            weight: 0.6,
            combine: 3,
        },
        PredictorSpec::Dwcma,
        PredictorSpec::Udwcma,
        PredictorSpec::Arma {
            ar: vec![0.6, 0.3],
            ma: vec![0.2],
        },
        PredictorSpec::Saa {
            model: SaaModel::Altitude,
            trig: TrigApprox::taylor(9),
        },
        PredictorSpec::Wep {
            error_adjustment: true,
        },
        PredictorSpec::Wep {
            error_adjustment: false,
        },
    ];

    for spec in specs {
        let name = spec.name();
        let uses_pool = spec.uses_pool();
        let config = EvaluationConfig::default().with_horizon(4, 1).with_window(3);
        let report = Evaluator::new(config, spec)
            .unwrap()
            .run_solar(&challenge, &pool)
            .unwrap_or_else(|e| panic!("{name}: {e}"));

        assert_eq!(report.pool_size, if uses_pool { 4 } else { 0 }, "{name}");
        assert_eq!(report.horizons.len(), 4, "{name}");
        for horizon in &report.horizons {
            let metrics = horizon.metrics.as_ref().unwrap();
            assert!(metrics.mae.is_finite(), "{name}");
            assert!(metrics.rmse >= metrics.mae - 1e-9, "{name}");
        }
    }
}

#[test]
fn closest_day_reproduces_the_challenge() {
    let challenge = challenge(90.0);
    let mut pool = pool();
    pool.push(day(june(16), 90.0));
    let config = EvaluationConfig::default().with_horizon(3, 1).with_window(4);
    let spec = PredictorSpec::Ewma {
        alpha: 0.0,
        combine: 1,
    };
    let report = Evaluator::new(config, spec)
        .unwrap()
        .run_solar(&challenge, &pool)
        .unwrap();
    for horizon in &report.horizons {
        assert_relative_eq!(horizon.metrics.as_ref().unwrap().mae, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn accumulated_mode_scores_harvested_energy() {
    let challenge = challenge(90.0);
    let config = EvaluationConfig::new(14, 30)
        .with_horizon(4, 2)
        .with_accumulated(true);
    let report = Evaluator::new(config, PredictorSpec::Dumb)
        .unwrap()
        .run_solar(&challenge, &[])
        .unwrap();

    let power_factor = challenge.day_power_factor();
    let horizon = report.horizon(4).unwrap();
    for point in &horizon.points {
        let origin: Timeslot = point.timeslot - 4;
        let expected = challenge.energy_harvested(origin, point.timeslot, power_factor);
        assert_relative_eq!(point.actual, expected, epsilon = 1e-9);
        // the flat forecast holds the origin reading for four slots
        let held = challenge.value_at(origin).value() * 4.0 * power_factor;
        assert_relative_eq!(point.predicted, held, epsilon = 1e-6);
    }
}

#[test]
fn saa_without_a_sun_is_rejected() {
    let challenge = day(june(21), 90.0);
    let spec = PredictorSpec::Saa {
        model: SaaModel::Sine,
        trig: TrigApprox::exact(),
    };
    let err = Evaluator::new(EvaluationConfig::default(), spec)
        .unwrap()
        .run(&challenge, &[])
        .unwrap_err();
    assert!(matches!(err, ForecastError::InvalidParameter(_)));
}

#[test]
fn pool_loaded_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    for (d, peak) in [(17, 50.0), (19, 70.0), (20, 85.0)] {
        let lines: Vec<String> = production(peak).iter().map(|v| format!("{v:.6}")).collect();
        let path = dir.path().join(format!("202406{d}.trace"));
        fs::write(path, lines.join("\n")).unwrap();
    }
    fs::write(dir.path().join("notes.txt"), "not a trace").unwrap();

    let loader = TraceLoader::new(1).unwrap();
    let pool = loader
        .load_pool(dir.path(), ".trace", Some(june(21)), 2)
        .unwrap();
    let labels: Vec<_> = pool.iter().map(|s| s.label().to_string()).collect();
    assert_eq!(labels, vec!["20240619.trace", "20240620.trace"]);
    assert_eq!(pool[0].date(), Some(june(19)));

    let challenge = challenge(80.0);
    let config = EvaluationConfig::default().with_horizon(2, 1).with_window(3);
    let spec = PredictorSpec::IproEnergy {
        weight: 0.5,
        combine: 2,
    };
    let report = Evaluator::new(config, spec)
        .unwrap()
        .run_solar(&challenge, &pool)
        .unwrap();
    assert_eq!(report.pool_size, 2);
    assert!(report.to_string().contains("Horizon: 2"));
}
