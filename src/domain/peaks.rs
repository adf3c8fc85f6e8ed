//! Kick detection by peak picking
//!
//! A sample is a peak when it rises strictly above both neighbours and
//! reaches `min_height`. Peaks closer than the minimum separation compete:
//! the higher one survives, and on equal height the earlier one.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Thresholds for accepting a peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakCriteria {
    /// Minimum peak value, in signal units
    pub min_height: f64,
    /// Minimum time between two accepted peaks
    pub min_separation_sec: f64,
}

impl Default for PeakCriteria {
    fn default() -> Self {
        Self {
            min_height: 1.5,
            min_separation_sec: 0.5,
        }
    }
}

impl PeakCriteria {
    /// Minimum spacing expressed in samples, rounded up
    pub fn distance_samples(&self, sample_rate_hz: f64) -> Result<usize> {
        let distance = (self.min_separation_sec * sample_rate_hz).ceil();
        if !distance.is_finite() || distance < 1.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "peak separation of {} s at {} Hz is less than one sample",
                self.min_separation_sec, sample_rate_hz
            )));
        }
        Ok(distance as usize)
    }
}

/// Interior strict local maxima at or above `min_height`
fn candidates(signal: &[f64], min_height: f64) -> Vec<usize> {
    if signal.len() < 3 {
        return Vec::new();
    }
    (1..signal.len() - 1)
        .filter(|&i| {
            let v = signal[i];
            v > signal[i - 1] && v > signal[i + 1] && v >= min_height
        })
        .collect()
}

/// Indices of accepted peaks, ascending
pub fn detect_peaks(signal: &[f64], sample_rate_hz: f64, criteria: &PeakCriteria) -> Result<Vec<usize>> {
    let distance = criteria.distance_samples(sample_rate_hz)?;

    let mut by_priority = candidates(signal, criteria.min_height);
    by_priority.sort_by(|&a, &b| {
        signal[b]
            .partial_cmp(&signal[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut kept: Vec<usize> = Vec::with_capacity(by_priority.len());
    for idx in by_priority {
        if kept.iter().all(|&k| k.abs_diff(idx) >= distance) {
            kept.push(idx);
        }
    }
    kept.sort_unstable();
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(min_height: f64, min_separation_sec: f64) -> PeakCriteria {
        PeakCriteria {
            min_height,
            min_separation_sec,
        }
    }

    #[test]
    fn test_well_separated_peaks() {
        let signal = [0.0, 0.0, 2.0, 0.0, 0.0, 3.0, 0.0, 0.0, 2.5, 0.0];
        let peaks = detect_peaks(&signal, 10.0, &criteria(1.5, 0.2)).unwrap();
        assert_eq!(peaks, vec![2, 5, 8]);
    }

    #[test]
    fn test_close_peaks_keep_the_larger() {
        // Peaks at 2 and 4 are two samples apart, distance is three
        let signal = [0.0, 0.0, 2.0, 1.0, 3.0, 0.0, 0.0];
        let peaks = detect_peaks(&signal, 10.0, &criteria(1.5, 0.3)).unwrap();
        assert_eq!(peaks, vec![4]);

        let signal = [0.0, 4.0, 0.0, 2.0, 0.0];
        let peaks = detect_peaks(&signal, 10.0, &criteria(1.5, 0.3)).unwrap();
        assert_eq!(peaks, vec![1]);
    }

    #[test]
    fn test_equal_peaks_keep_the_earlier() {
        let signal = [0.0, 2.0, 0.0, 2.0, 0.0];
        let peaks = detect_peaks(&signal, 10.0, &criteria(1.5, 0.3)).unwrap();
        assert_eq!(peaks, vec![1]);
    }

    #[test]
    fn test_height_threshold_and_plateaus() {
        let signal = [0.0, 1.4, 0.0, 1.5, 0.0, 2.0, 2.0, 0.0];
        let peaks = detect_peaks(&signal, 10.0, &criteria(1.5, 0.1)).unwrap();
        // 1.4 is too low and the flat top at 5..6 is not a strict maximum
        assert_eq!(peaks, vec![3]);
    }

    #[test]
    fn test_endpoints_never_peak() {
        let signal = [5.0, 0.0, 0.0, 5.0];
        assert!(detect_peaks(&signal, 10.0, &PeakCriteria::default()).unwrap().is_empty());
    }

    #[test]
    fn test_nothing_above_height_is_empty() {
        let signal = [0.0, 1.0, 0.0, 1.2, 0.0];
        assert!(detect_peaks(&signal, 50.0, &PeakCriteria::default()).unwrap().is_empty());
        assert!(detect_peaks(&[], 50.0, &PeakCriteria::default()).unwrap().is_empty());
    }

    #[test]
    fn test_sub_sample_separation_is_invalid() {
        let result = detect_peaks(&[0.0, 2.0, 0.0], 10.0, &criteria(1.5, 0.0));
        assert!(matches!(result, Err(AnalysisError::InvalidParameter(_))));
    }

    #[test]
    fn test_distance_rounds_up() {
        let c = criteria(1.5, 0.5);
        assert_eq!(c.distance_samples(49.3).unwrap(), 25);
        assert_eq!(c.distance_samples(50.0).unwrap(), 25);
    }
}
