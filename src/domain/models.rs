use serde::{Deserialize, Serialize};
use std::fmt;

/// Which controller of the pair a reading came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceId {
    Left,
    Right,
}

impl DeviceId {
    pub const ALL: [DeviceId; 2] = [DeviceId::Left, DeviceId::Right];

    /// Lowercase name used in log records and file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "Left"),
            Self::Right => write!(f, "Right"),
        }
    }
}

/// Three-axis reading. Absent fields in a record read as 0.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn add(&self, other: &Vector3) -> Vector3 {
        Vector3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(&self, other: &Vector3) -> Vector3 {
        Vector3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

/// Accelerometer and gyroscope pair as reported by one poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionReading {
    pub accel: Vector3,
    pub gyro: Vector3,
}

/// Button state relevant to acquisition (calibration triggers)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonState {
    /// Capture button on the left Joy-Con
    pub capture: bool,
    /// Home button on the right Joy-Con
    pub home: bool,
}

impl ButtonState {
    /// The button that requests a calibration on the given side
    pub fn calibration_pressed(&self, device: DeviceId) -> bool {
        match device {
            DeviceId::Left => self.capture,
            DeviceId::Right => self.home,
        }
    }
}

/// Full status returned by a motion source on each poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerStatus {
    pub accel: Vector3,
    pub gyro: Vector3,
    pub buttons: ButtonState,
}

impl ControllerStatus {
    pub fn motion(&self) -> MotionReading {
        MotionReading {
            accel: self.accel,
            gyro: self.gyro,
        }
    }
}

/// One timestamped motion record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Unix milliseconds
    pub timestamp: i64,
    pub device: DeviceId,
    pub accel: Vector3,
    pub gyro: Vector3,
}

impl Sample {
    pub fn new(timestamp: i64, device: DeviceId, motion: MotionReading) -> Self {
        Self {
            timestamp,
            device,
            accel: motion.accel,
            gyro: motion.gyro,
        }
    }
}

/// Sensor axis, ordered by selection precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected kick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Event {
    /// Position in the series
    pub index: usize,
    /// Seconds since the first sample of the series
    pub time_sec: f64,
    /// Combined gyro magnitude relative to the strongest event in the batch
    pub intensity_pct: f64,
}

/// Messages pushed from the acquisition loop to whoever is watching it
#[derive(Debug, Clone)]
pub enum AppEvent {
    Sample(Sample),
    Calibrated(DeviceId),
    LogMessage(StatusMessage),
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}
