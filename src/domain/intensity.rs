//! Relative kick intensity
//!
//! Each event is scored by the combined gyro magnitude at its index and
//! expressed as a percentage of the strongest event in the same batch.

use crate::domain::models::Event;
use crate::domain::series::Axes;
use crate::error::{AnalysisError, Result};

/// Vector norm of the three axes at each index
pub fn magnitudes(x: &[f64], y: &[f64], z: &[f64], indices: &[usize]) -> Result<Vec<f64>> {
    let len = x.len().min(y.len()).min(z.len());
    indices
        .iter()
        .map(|&i| {
            if i >= len {
                return Err(AnalysisError::InvalidParameter(format!(
                    "event index {} outside series of length {}",
                    i, len
                )));
            }
            Ok((x[i] * x[i] + y[i] * y[i] + z[i] * z[i]).sqrt())
        })
        .collect()
}

/// Scale a batch so its largest value becomes 100
pub fn normalize_percent(values: &[f64]) -> Result<Vec<f64>> {
    if values.is_empty() {
        return Ok(Vec::new());
    }
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_nan() || max <= 0.0 {
        return Err(AnalysisError::ZeroMagnitude);
    }
    Ok(values.iter().map(|v| v / max * 100.0).collect())
}

/// Percent intensity for each event index. An empty batch scores empty.
pub fn score_events(x: &[f64], y: &[f64], z: &[f64], indices: &[usize]) -> Result<Vec<f64>> {
    normalize_percent(&magnitudes(x, y, z, indices)?)
}

/// Build [`Event`]s from detected indices and the gyro axes they were found on
pub fn events_from_indices(gyro: &Axes, time_sec: &[f64], indices: &[usize]) -> Result<Vec<Event>> {
    let scores = score_events(&gyro.x, &gyro.y, &gyro.z, indices)?;
    indices
        .iter()
        .zip(scores)
        .map(|(&index, intensity_pct)| {
            let time_sec = *time_sec.get(index).ok_or_else(|| {
                AnalysisError::InvalidParameter(format!("no time for event index {}", index))
            })?;
            Ok(Event {
                index,
                time_sec,
                intensity_pct,
            })
        })
        .collect()
}
