//! Line-delimited JSON record shapes
//!
//! ```text
//! {"timestamp": 1718000000000, "joycon": "left", "motion": {"accel": {...}, "gyro": {...}}}
//! {"timestamp": 1718000000000, "joycon": "left", "status": {"accel": {...}, "gyro": {...}, "buttons": {...}}}
//! ```
//!
//! Only the `motion` shape feeds analysis. `status` lines are written in the
//! recorder's "all" mode and skipped by the parser.

use crate::domain::models::{ControllerStatus, DeviceId, MotionReading};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Loose view of any log line. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
pub struct LogLine {
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub joycon: Option<String>,
    /// Kept as a raw object so an empty `{}` can be told apart from a
    /// reading whose fields all default to zero
    #[serde(default)]
    pub motion: Option<Map<String, Value>>,
}

impl LogLine {
    /// The motion payload, `None` when absent or an empty object
    pub fn motion_reading(&self) -> Option<serde_json::Result<MotionReading>> {
        self.motion
            .as_ref()
            .filter(|m| !m.is_empty())
            .map(|m| serde_json::from_value(Value::Object(m.clone())))
    }
}

#[derive(Debug, Serialize)]
pub struct MotionRecord<'a> {
    pub timestamp: i64,
    pub joycon: DeviceId,
    pub motion: &'a MotionReading,
}

#[derive(Debug, Serialize)]
pub struct StatusRecord<'a> {
    pub timestamp: i64,
    pub joycon: DeviceId,
    pub status: &'a ControllerStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Vector3;

    #[test]
    fn test_motion_record_shape() {
        let motion = MotionReading {
            accel: Vector3::new(1.0, 2.0, 3.0),
            gyro: Vector3::new(-1.0, 0.0, 4.0),
        };
        let record = MotionRecord {
            timestamp: 42,
            joycon: DeviceId::Right,
            motion: &motion,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["joycon"], "right");
        assert_eq!(value["timestamp"], 42);
        assert_eq!(value["motion"]["gyro"]["z"], 4.0);
    }

    #[test]
    fn test_log_line_ignores_status_payload() {
        let line: LogLine = serde_json::from_str(
            r#"{"timestamp": 1, "joycon": "left", "status": {"buttons": {"home": true}}}"#,
        )
        .unwrap();
        assert!(line.motion_reading().is_none());
        assert_eq!(line.joycon.as_deref(), Some("left"));
    }

    #[test]
    fn test_empty_motion_object_is_no_reading() {
        let line: LogLine =
            serde_json::from_str(r#"{"timestamp": 1, "joycon": "left", "motion": {}}"#).unwrap();
        assert!(line.motion.is_some());
        assert!(line.motion_reading().is_none());

        let line: LogLine =
            serde_json::from_str(r#"{"timestamp": 1, "joycon": "left", "motion": {"gyro": {"y": 2}}}"#)
                .unwrap();
        let reading = line.motion_reading().unwrap().unwrap();
        assert_eq!(reading.gyro.y, 2.0);
        assert_eq!(reading.accel.x, 0.0);
    }

    #[test]
    fn test_mistyped_motion_is_an_error() {
        let line: LogLine =
            serde_json::from_str(r#"{"timestamp": 1, "joycon": "left", "motion": {"accel": "fast"}}"#)
                .unwrap();
        assert!(line.motion_reading().unwrap().is_err());
    }
}
