//! Kick analysis for one device series
//!
//! ```text
//! Series ─► low-pass ×6 ─► unit scaling ─► dominant gyro axis ─► peaks ─► intensity
//! ```

use crate::domain::axis::AxisEnergy;
use crate::domain::filter::LowPassFilter;
use crate::domain::intensity::events_from_indices;
use crate::domain::models::{Axis, DeviceId, Event};
use crate::domain::parser::ParsedLog;
use crate::domain::peaks::detect_peaks;
use crate::domain::series::{Axes, Series};
use crate::domain::settings::AnalysisSettings;
use crate::error::{AnalysisError, Result};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Filtered, scaled signals and detected kicks for one device
#[derive(Debug, Clone)]
pub struct DeviceAnalysis {
    pub device: DeviceId,
    pub sample_rate_hz: f64,
    pub time_sec: Vec<f64>,
    /// Filtered accelerometer in g
    pub accel: Axes,
    /// Filtered gyroscope in rad/s
    pub gyro: Axes,
    pub axis_energy: AxisEnergy,
    pub dominant_axis: Axis,
    pub events: Vec<Event>,
}

impl DeviceAnalysis {
    pub fn kick_count(&self) -> usize {
        self.events.len()
    }

    /// The gyro signal the kicks were detected on
    pub fn dominant_signal(&self) -> &[f64] {
        self.gyro.axis(self.dominant_axis)
    }
}

fn resolve_sample_rate(series: &Series, settings: &AnalysisSettings) -> Result<f64> {
    match settings.sample_rate_hz {
        Some(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
        Some(rate) => Err(AnalysisError::InvalidParameter(format!(
            "declared sample rate must be positive, got {}",
            rate
        ))),
        None => series.mean_sample_rate_hz(),
    }
}

/// Run the full pipeline on one series
pub fn analyze_series(series: &Series, settings: &AnalysisSettings) -> Result<DeviceAnalysis> {
    let device = series.device();
    if series.is_empty() {
        return Err(AnalysisError::EmptyInput(format!("no samples for {} Joy-Con", device)));
    }

    let sample_rate_hz = resolve_sample_rate(series, settings)?;
    let filter = LowPassFilter::new(sample_rate_hz, settings.cutoff_hz, settings.filter_order)?;
    debug!(
        "{} Joy-Con: {} samples at {:.2} Hz, cutoff {} Hz, order {}",
        device,
        series.len(),
        sample_rate_hz,
        settings.cutoff_hz,
        settings.filter_order
    );

    let smooth = |col: &[f64]| Ok(filter.apply(col));
    let accel = series.accel().try_map(smooth)?.scaled(settings.accel_scale);
    let gyro = series.gyro().try_map(smooth)?.scaled(settings.gyro_scale);

    let axis_energy = AxisEnergy::of(&gyro.x, &gyro.y, &gyro.z);
    let dominant_axis = axis_energy.dominant();

    let time_sec = series.time_sec();
    let peaks = detect_peaks(gyro.axis(dominant_axis), sample_rate_hz, &settings.peaks)?;
    let events = events_from_indices(&gyro, &time_sec, &peaks)?;

    info!(
        "{} Joy-Con: {} kicks on gyro {} axis",
        device,
        events.len(),
        dominant_axis
    );

    Ok(DeviceAnalysis {
        device,
        sample_rate_hz,
        time_sec,
        accel,
        gyro,
        axis_energy,
        dominant_axis,
        events,
    })
}

/// Analyze every device in a log independently. A failure on one device
/// does not stop the others.
pub fn analyze_log(
    log: &ParsedLog,
    settings: &AnalysisSettings,
) -> BTreeMap<DeviceId, Result<DeviceAnalysis>> {
    log.series
        .iter()
        .map(|(&device, series)| {
            let result = analyze_series(series, settings);
            if let Err(e) = &result {
                warn!("Analysis failed for {} Joy-Con: {}", device, e);
            }
            (device, result)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{MotionReading, Sample, Vector3};
    use crate::domain::series::SeriesBuilder;
    use std::f64::consts::PI;

    /// Kick-like bursts on the gyro y axis every `period` seconds
    fn kicking_series(seconds: f64, rate: f64, period: f64) -> Series {
        let mut builder = SeriesBuilder::new(DeviceId::Right);
        let n = (seconds * rate) as usize;
        for i in 0..n {
            let t = i as f64 / rate;
            let phase = (t % period) / period;
            let burst = if phase < 0.3 {
                (PI * phase / 0.3).sin().powi(2) * 4.0
            } else {
                0.0
            };
            let sample = Sample::new(
                1_700_000_000_000 + (t * 1000.0).round() as i64,
                DeviceId::Right,
                MotionReading {
                    accel: Vector3::new(0.0, 0.0, 1.0),
                    gyro: Vector3::new(0.2 * burst, burst, 0.1),
                },
            );
            builder.push(&sample).unwrap();
        }
        builder.build()
    }

    fn unit_settings() -> AnalysisSettings {
        AnalysisSettings {
            gyro_scale: 1.0,
            accel_scale: 1.0,
            ..AnalysisSettings::default()
        }
    }

    #[test]
    fn test_detects_periodic_kicks_on_dominant_axis() {
        let series = kicking_series(10.0, 50.0, 1.0);
        let analysis = analyze_series(&series, &unit_settings()).unwrap();

        assert_eq!(analysis.dominant_axis, Axis::Y);
        assert_eq!(analysis.kick_count(), 10);
        assert_eq!(analysis.gyro.len(), series.len());
        assert!((analysis.sample_rate_hz - 50.0).abs() < 0.1);

        let strongest = analysis
            .events
            .iter()
            .map(|e| e.intensity_pct)
            .fold(0.0, f64::max);
        assert_eq!(strongest, 100.0);
        for event in &analysis.events {
            assert!(event.intensity_pct > 0.0 && event.intensity_pct <= 100.0);
        }
    }

    #[test]
    fn test_raw_series_is_not_modified() {
        let series = kicking_series(2.0, 50.0, 1.0);
        let before = series.clone();
        let _ = analyze_series(&series, &unit_settings()).unwrap();
        assert_eq!(series, before);
    }

    #[test]
    fn test_declared_rate_overrides_mean_interval() {
        let series = kicking_series(4.0, 50.0, 1.0);
        let settings = AnalysisSettings {
            sample_rate_hz: Some(100.0),
            ..unit_settings()
        };
        let analysis = analyze_series(&series, &settings).unwrap();
        assert_eq!(analysis.sample_rate_hz, 100.0);

        let bad = AnalysisSettings {
            sample_rate_hz: Some(0.0),
            ..unit_settings()
        };
        assert!(analyze_series(&series, &bad).is_err());
    }

    #[test]
    fn test_cutoff_above_nyquist_fails_the_call() {
        let series = kicking_series(2.0, 50.0, 1.0);
        let settings = AnalysisSettings {
            cutoff_hz: 30.0,
            ..unit_settings()
        };
        assert!(matches!(
            analyze_series(&series, &settings),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_empty_series_reports_empty_input() {
        let series = SeriesBuilder::new(DeviceId::Left).build();
        let err = analyze_series(&series, &unit_settings()).unwrap_err();
        assert!(err.is_empty_input());
    }

    #[test]
    fn test_quiet_series_has_no_events() {
        let mut builder = SeriesBuilder::new(DeviceId::Left);
        for i in 0..100 {
            builder
                .push(&Sample::new(i * 20, DeviceId::Left, MotionReading::default()))
                .unwrap();
        }
        let analysis = analyze_series(&builder.build(), &unit_settings()).unwrap();
        assert!(analysis.events.is_empty());
        assert_eq!(analysis.dominant_axis, Axis::X);
    }
}
