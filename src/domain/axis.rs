//! Dominant rotation axis
//!
//! A kick swings the leg mostly about one axis, so the gyro axis with the
//! largest cumulative absolute signal is the one to search for events.

use crate::domain::models::Axis;
use serde::Serialize;

/// Sum of absolute values on each axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisEnergy {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AxisEnergy {
    pub fn of(x: &[f64], y: &[f64], z: &[f64]) -> Self {
        let total = |col: &[f64]| col.iter().map(|v| v.abs()).sum::<f64>();
        Self {
            x: total(x),
            y: total(y),
            z: total(z),
        }
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Axis with the largest sum; on a tie the earlier axis in X, Y, Z wins
    pub fn dominant(&self) -> Axis {
        let mut best = Axis::X;
        for axis in [Axis::Y, Axis::Z] {
            if self.get(axis) > self.get(best) {
                best = axis;
            }
        }
        best
    }
}

pub fn dominant_axis(x: &[f64], y: &[f64], z: &[f64]) -> Axis {
    AxisEnergy::of(x, y, z).dominant()
}
