//! Per-device motion series
//!
//! A [`Series`] stores one controller's samples as parallel arrays so each
//! axis can be filtered on its own. It is assembled once through a
//! [`SeriesBuilder`], either sample by sample while recording or in one batch
//! from a parsed log, and never changes afterwards. Filtering derives new
//! [`Axes`] and leaves the raw series untouched.

use crate::domain::models::{Axis, DeviceId, Sample, Vector3};
use crate::error::{AnalysisError, Result};
use serde::Serialize;

/// Three equally long columns, one per axis
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Axes {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl Axes {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn axis(&self, axis: Axis) -> &[f64] {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    fn push(&mut self, v: &Vector3) {
        self.x.push(v.x);
        self.y.push(v.y);
        self.z.push(v.z);
    }

    /// Apply `f` to every column, producing new columns
    pub fn try_map<F>(&self, mut f: F) -> Result<Axes>
    where
        F: FnMut(&[f64]) -> Result<Vec<f64>>,
    {
        Ok(Axes {
            x: f(&self.x)?,
            y: f(&self.y)?,
            z: f(&self.z)?,
        })
    }

    pub fn scaled(&self, factor: f64) -> Axes {
        let scale = |col: &[f64]| col.iter().map(|v| v * factor).collect();
        Axes {
            x: scale(&self.x),
            y: scale(&self.y),
            z: scale(&self.z),
        }
    }
}

/// Milliseconds from `start` to `t`, without overflowing on extreme stamps
fn elapsed_ms(start: i64, t: i64) -> f64 {
    (i128::from(t) - i128::from(start)) as f64
}

/// Immutable time series of one device's samples
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    device: DeviceId,
    timestamps: Vec<i64>,
    accel: Axes,
    gyro: Axes,
}

impl Series {
    pub fn device(&self) -> DeviceId {
        self.device
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn accel(&self) -> &Axes {
        &self.accel
    }

    pub fn gyro(&self) -> &Axes {
        &self.gyro
    }

    /// Seconds relative to the first sample
    pub fn time_sec(&self) -> Vec<f64> {
        let Some(&start) = self.timestamps.first() else {
            return Vec::new();
        };
        self.timestamps
            .iter()
            .map(|&t| elapsed_ms(start, t) / 1000.0)
            .collect()
    }

    /// Sampling rate from the mean interval between consecutive samples.
    ///
    /// Assumes roughly uniform polling; jittery input shifts the effective
    /// filter cutoff without being reported.
    pub fn mean_sample_rate_hz(&self) -> Result<f64> {
        let n = self.timestamps.len();
        if n < 2 {
            return Err(AnalysisError::InvalidParameter(format!(
                "{} samples are not enough to derive a sample rate",
                n
            )));
        }
        let span_sec = elapsed_ms(self.timestamps[0], self.timestamps[n - 1]) / 1000.0;
        if span_sec <= 0.0 {
            return Err(AnalysisError::InvalidParameter(
                "all samples share one timestamp".to_string(),
            ));
        }
        let mean_interval = span_sec / (n - 1) as f64;
        Ok(1.0 / mean_interval)
    }

    /// Rebuild the individual samples, mainly for re-export and inspection
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.timestamps.iter().enumerate().map(move |(i, &t)| Sample {
            timestamp: t,
            device: self.device,
            accel: Vector3::new(self.accel.x[i], self.accel.y[i], self.accel.z[i]),
            gyro: Vector3::new(self.gyro.x[i], self.gyro.y[i], self.gyro.z[i]),
        })
    }
}

/// Accumulates samples for one device, in arrival order
#[derive(Debug, Clone)]
pub struct SeriesBuilder {
    series: Series,
}

impl SeriesBuilder {
    pub fn new(device: DeviceId) -> Self {
        Self {
            series: Series {
                device,
                timestamps: Vec::new(),
                accel: Axes::default(),
                gyro: Axes::default(),
            },
        }
    }

    pub fn device(&self) -> DeviceId {
        self.series.device
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Append one sample. Rejects samples from another device and
    /// timestamps earlier than the last accepted one.
    pub fn push(&mut self, sample: &Sample) -> Result<()> {
        if sample.device != self.series.device {
            return Err(AnalysisError::InvalidParameter(format!(
                "{} sample pushed into {} series",
                sample.device, self.series.device
            )));
        }
        if let Some(&last) = self.series.timestamps.last() {
            if sample.timestamp < last {
                return Err(AnalysisError::InvalidParameter(format!(
                    "timestamp {} precedes previous {}",
                    sample.timestamp, last
                )));
            }
        }
        self.series.timestamps.push(sample.timestamp);
        self.series.accel.push(&sample.accel);
        self.series.gyro.push(&sample.gyro);
        Ok(())
    }

    pub fn extend<'a, I>(&mut self, samples: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Sample>,
    {
        for sample in samples {
            self.push(sample)?;
        }
        Ok(())
    }

    /// Copy of what has been collected so far, leaving the builder usable
    pub fn snapshot(&self) -> Series {
        self.series.clone()
    }

    pub fn build(self) -> Series {
        self.series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::MotionReading;

    fn sample(t: i64, gyro_x: f64) -> Sample {
        Sample::new(
            t,
            DeviceId::Left,
            MotionReading {
                accel: Vector3::new(0.0, 0.0, 1.0),
                gyro: Vector3::new(gyro_x, 0.0, 0.0),
            },
        )
    }

    #[test]
    fn test_builder_keeps_columns_aligned() {
        let mut builder = SeriesBuilder::new(DeviceId::Left);
        builder.push(&sample(1000, 1.0)).unwrap();
        builder.push(&sample(1020, 2.0)).unwrap();
        builder.push(&sample(1020, 3.0)).unwrap(); // duplicate timestamp is fine
        let series = builder.build();

        assert_eq!(series.len(), 3);
        assert_eq!(series.accel().len(), 3);
        assert_eq!(series.gyro().x, vec![1.0, 2.0, 3.0]);
        assert_eq!(series.accel().z, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_builder_rejects_backwards_time_and_foreign_device() {
        let mut builder = SeriesBuilder::new(DeviceId::Left);
        builder.push(&sample(2000, 0.0)).unwrap();
        assert!(builder.push(&sample(1999, 0.0)).is_err());

        let mut right = sample(3000, 0.0);
        right.device = DeviceId::Right;
        assert!(builder.push(&right).is_err());
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_time_and_rate() {
        let mut builder = SeriesBuilder::new(DeviceId::Left);
        for i in 0..5 {
            builder.push(&sample(10_000 + i * 20, 0.0)).unwrap();
        }
        let series = builder.build();
        assert_eq!(series.time_sec(), vec![0.0, 0.02, 0.04, 0.06, 0.08]);
        assert!((series.mean_sample_rate_hz().unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_rate_needs_two_distinct_timestamps() {
        let mut builder = SeriesBuilder::new(DeviceId::Left);
        builder.push(&sample(5, 0.0)).unwrap();
        assert!(builder.snapshot().mean_sample_rate_hz().is_err());
        builder.push(&sample(5, 0.0)).unwrap();
        assert!(builder.build().mean_sample_rate_hz().is_err());
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let mut builder = SeriesBuilder::new(DeviceId::Left);
        builder.push(&sample(i64::MIN + 1, 0.0)).unwrap();
        builder.push(&sample(i64::MAX - 1, 0.0)).unwrap();
        let series = builder.build();

        let time = series.time_sec();
        assert_eq!(time[0], 0.0);
        assert!(time[1] > 1.8e16);
        let rate = series.mean_sample_rate_hz().unwrap();
        assert!(rate > 0.0 && rate < 1e-15);
    }

    #[test]
    fn test_samples_round_trip() {
        let mut builder = SeriesBuilder::new(DeviceId::Left);
        let input = [sample(1, 0.5), sample(2, -0.5)];
        builder.extend(&input).unwrap();
        let series = builder.build();
        let back: Vec<Sample> = series.samples().collect();
        assert_eq!(back, input);
    }
}
