use crate::domain::peaks::PeakCriteria;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_false")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_false(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_false(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "diagnostics".to_string()
}
fn default_prefix() -> String {
    "joycon_imu".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

/// Raw gyro counts to rad/s
pub const GYRO_COUNTS_TO_RAD_S: f64 = 0.0001694 * 2.0 * PI;
/// Raw accelerometer counts to g
pub const ACCEL_COUNTS_TO_G: f64 = 16000.0 / 65536.0 / 1000.0;

/// Tuning for the offline kick analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub filter_order: usize,
    pub cutoff_hz: f64,
    /// Declared sampling rate. `None` derives it from each series'
    /// mean sample interval.
    pub sample_rate_hz: Option<f64>,
    pub peaks: PeakCriteria,
    pub gyro_scale: f64,
    pub accel_scale: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            filter_order: 4,
            cutoff_hz: 6.0,
            sample_rate_hz: None,
            peaks: PeakCriteria::default(),
            gyro_scale: GYRO_COUNTS_TO_RAD_S,
            accel_scale: ACCEL_COUNTS_TO_G,
        }
    }
}

/// What the recorder writes for each poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    /// Timestamped accel and gyro only
    Motion,
    /// Full controller status including buttons
    All,
    /// Poll and display without writing a log
    None,
}

impl FromStr for LogMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "motion" => Ok(Self::Motion),
            "all" => Ok(Self::All),
            "none" => Ok(Self::None),
            other => Err(anyhow::anyhow!("Unknown log mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSettings {
    pub poll_rate_hz: f64,
    pub log_dir: String,
    pub log_mode: LogMode,
    /// Points kept per axis for the live view
    pub history_length: usize,
    pub print_samples: bool,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            poll_rate_hz: 50.0,
            log_dir: "logs".to_string(),
            log_mode: LogMode::Motion,
            history_length: 100,
            print_samples: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub log_settings: LogSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub recorder: RecorderSettings,
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
    /// Why the file was not used, when defaults were substituted
    fallback_reason: Option<String>,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Ok(Self::at_path(settings_path))
    }

    /// Load from `settings_path`, falling back to defaults when it is
    /// missing or unreadable. A file that exists but was not used is noted
    /// in [`Self::fallback_reason`], since this runs before logging is set up.
    pub fn at_path(settings_path: PathBuf) -> Self {
        let (settings, fallback_reason) = if settings_path.exists() {
            match Self::load_from_file(&settings_path) {
                Ok(settings) => (settings, None),
                Err(e) => (Settings::default(), Some(e.to_string())),
            }
        } else {
            (Settings::default(), None)
        };
        Self {
            settings,
            settings_path,
            fallback_reason,
        }
    }

    /// Load a file the user named explicitly. A missing file means defaults;
    /// a file that exists but cannot be read or parsed is an error.
    pub fn from_file(settings_path: PathBuf) -> anyhow::Result<Self> {
        if !settings_path.exists() {
            return Ok(Self {
                settings: Settings::default(),
                fallback_reason: Some("file does not exist".to_string()),
                settings_path,
            });
        }
        let settings = Self::load_from_file(&settings_path).map_err(|e| {
            anyhow::anyhow!("Invalid settings file {}: {}", settings_path.display(), e)
        })?;
        Ok(Self {
            settings,
            settings_path,
            fallback_reason: None,
        })
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        self.fallback_reason.as_deref()
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("JoyconImu");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}
