//! Motion sources
//!
//! A [`MotionSource`] is anything that can be asked for the current
//! controller status on demand. The hardware driver for real Joy-Cons plugs
//! in here; [`SyntheticSource`] produces repeatable kick motion so the
//! recorder and the analysis can run without a controller attached.

use crate::domain::models::{ButtonState, ControllerStatus, DeviceId, MotionReading, Vector3};
use crate::error::AcquisitionError;
use std::f64::consts::PI;

/// Pull-model access to one controller
pub trait MotionSource: Send {
    fn device(&self) -> DeviceId;

    /// Read the current status. Errors mean the device is gone.
    fn poll(&mut self) -> Result<ControllerStatus, AcquisitionError>;

    /// Treat `reading`, as last reported, as the new zero for both sensors
    fn calibrate(&mut self, reading: &MotionReading);
}

/// Accelerometer counts per g at the default ±8 g range
const ACCEL_COUNTS_PER_G: f64 = 4096.0;

/// Deterministic stand-in for a Joy-Con.
///
/// Emits a kick-shaped burst on the gyro y axis once per `kick_period_sec`
/// on top of a resting gravity vector, a small gyro bias and a 13 Hz
/// ripple that the low-pass filter should remove.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    device: DeviceId,
    poll_rate_hz: f64,
    kick_period_sec: f64,
    kick_amplitude: f64,
    tick: u64,
    accel_offset: Vector3,
    gyro_offset: Vector3,
    button_press_tick: Option<u64>,
    disconnect_after: Option<u64>,
}

impl SyntheticSource {
    pub fn new(device: DeviceId, poll_rate_hz: f64) -> Self {
        Self {
            device,
            poll_rate_hz,
            kick_period_sec: 1.0,
            kick_amplitude: 4000.0,
            tick: 0,
            accel_offset: Vector3::ZERO,
            gyro_offset: Vector3::ZERO,
            button_press_tick: None,
            disconnect_after: None,
        }
    }

    pub fn with_kick_period(mut self, seconds: f64) -> Self {
        self.kick_period_sec = seconds;
        self
    }

    /// Hold the calibration button down on poll number `tick`
    pub fn with_button_press(mut self, tick: u64) -> Self {
        self.button_press_tick = Some(tick);
        self
    }

    /// Fail every poll after `polls` successful ones
    pub fn with_disconnect_after(mut self, polls: u64) -> Self {
        self.disconnect_after = Some(polls);
        self
    }

    fn raw_reading(&self, t: f64) -> MotionReading {
        let phase = (t % self.kick_period_sec) / self.kick_period_sec;
        let burst = if phase < 0.3 {
            (PI * phase / 0.3).sin().powi(2)
        } else {
            0.0
        };
        let ripple = (2.0 * PI * 13.0 * t).sin();

        MotionReading {
            accel: Vector3::new(
                120.0 * burst,
                -300.0 * burst,
                ACCEL_COUNTS_PER_G + 20.0 * ripple,
            ),
            gyro: Vector3::new(
                12.0 + 0.25 * self.kick_amplitude * burst,
                self.kick_amplitude * burst + 60.0 * ripple,
                -8.0,
            ),
        }
    }
}

impl MotionSource for SyntheticSource {
    fn device(&self) -> DeviceId {
        self.device
    }

    fn poll(&mut self) -> Result<ControllerStatus, AcquisitionError> {
        if let Some(limit) = self.disconnect_after {
            if self.tick >= limit {
                return Err(AcquisitionError::DeviceUnavailable(self.device));
            }
        }

        let t = self.tick as f64 / self.poll_rate_hz;
        let raw = self.raw_reading(t);
        let pressed = self.button_press_tick == Some(self.tick);
        self.tick += 1;

        Ok(ControllerStatus {
            accel: raw.accel.sub(&self.accel_offset),
            gyro: raw.gyro.sub(&self.gyro_offset),
            buttons: ButtonState {
                capture: pressed && self.device == DeviceId::Left,
                home: pressed && self.device == DeviceId::Right,
            },
        })
    }

    fn calibrate(&mut self, reading: &MotionReading) {
        self.accel_offset = self.accel_offset.add(&reading.accel);
        self.gyro_offset = self.gyro_offset.add(&reading.gyro);
    }
}
