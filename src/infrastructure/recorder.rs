//! Motion log writer
//!
//! Appends one JSON object per poll to the session log. The log is flushed
//! after every poll cycle so an interrupted session loses at most one cycle.

use crate::domain::models::{ControllerStatus, DeviceId};
use crate::domain::records::{MotionRecord, StatusRecord};
use crate::domain::settings::LogMode;
use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// `<dir>/joycon_log_<HH>_<MM>_<dd>_<mm>_<YYYY>.json`
pub fn default_log_path(log_dir: &Path, started: DateTime<Local>) -> PathBuf {
    log_dir.join(format!(
        "joycon_log_{}",
        started.format("%H_%M_%d_%m_%Y.json")
    ))
}

pub struct MotionRecorder {
    mode: LogMode,
    path: Option<PathBuf>,
    writer: Option<BufWriter<File>>,
    records: u64,
}

impl MotionRecorder {
    /// Open (append) the log at `path`, creating parent directories.
    /// In [`LogMode::None`] nothing is opened.
    pub fn create(path: &Path, mode: LogMode) -> anyhow::Result<Self> {
        if mode == LogMode::None {
            return Ok(Self::disabled());
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        info!("Logging {:?} records to {}", mode, path.display());

        Ok(Self {
            mode,
            path: Some(path.to_path_buf()),
            writer: Some(BufWriter::new(file)),
            records: 0,
        })
    }

    pub fn disabled() -> Self {
        Self {
            mode: LogMode::None,
            path: None,
            writer: None,
            records: 0,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn records_written(&self) -> u64 {
        self.records
    }

    pub fn record(&mut self, timestamp: i64, device: DeviceId, status: &ControllerStatus) -> io::Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };

        let line = match self.mode {
            LogMode::Motion => serde_json::to_string(&MotionRecord {
                timestamp,
                joycon: device,
                motion: &status.motion(),
            }),
            LogMode::All => serde_json::to_string(&StatusRecord {
                timestamp,
                joycon: device,
                status,
            }),
            LogMode::None => return Ok(()),
        }
        .map_err(io::Error::other)?;

        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        self.records += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Vector3;
    use crate::domain::parser::parse_file;
    use chrono::TimeZone;

    fn temp_log(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("joycon_imu_recorder_{}", std::process::id()))
            .join(name)
    }

    fn status(gyro_y: f64) -> ControllerStatus {
        ControllerStatus {
            accel: Vector3::new(0.0, 0.0, 4096.0),
            gyro: Vector3::new(0.0, gyro_y, 0.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_log_name() {
        let started = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap();
        let path = default_log_path(Path::new("logs"), started);
        assert_eq!(path, Path::new("logs").join("joycon_log_09_05_07_03_2024.json"));
    }

    #[test]
    fn test_motion_mode_round_trips_through_parser() {
        let path = temp_log("motion.json");
        let _ = fs::remove_file(&path);

        let mut recorder = MotionRecorder::create(&path, LogMode::Motion).unwrap();
        recorder.record(1000, DeviceId::Left, &status(1.0)).unwrap();
        recorder.record(1000, DeviceId::Right, &status(2.0)).unwrap();
        recorder.record(1020, DeviceId::Left, &status(3.0)).unwrap();
        recorder.flush().unwrap();
        assert_eq!(recorder.records_written(), 3);

        let parsed = parse_file(&path).unwrap();
        assert_eq!(parsed.warnings, 0);
        assert_eq!(parsed.device(DeviceId::Left).unwrap().gyro().y, vec![1.0, 3.0]);
        assert_eq!(parsed.device(DeviceId::Right).unwrap().accel().z, vec![4096.0]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_all_mode_is_ignored_by_parser() {
        let path = temp_log("all.json");
        let _ = fs::remove_file(&path);

        let mut recorder = MotionRecorder::create(&path, LogMode::All).unwrap();
        recorder.record(1000, DeviceId::Left, &status(1.0)).unwrap();
        recorder.flush().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"status\""));
        assert!(contents.contains("\"buttons\""));

        let parsed = parse_file(&path).unwrap();
        assert!(parsed.is_empty());
        assert_eq!(parsed.skipped, 1);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_none_mode_writes_nothing() {
        let path = temp_log("none.json");
        let _ = fs::remove_file(&path);

        let mut recorder = MotionRecorder::create(&path, LogMode::None).unwrap();
        recorder.record(1000, DeviceId::Left, &status(1.0)).unwrap();
        recorder.flush().unwrap();
        assert!(recorder.path().is_none());
        assert!(!path.exists());
    }
}
