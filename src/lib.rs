//! Joy-Con motion logging and kick analysis.
//!
//! Records accelerometer and gyroscope readings from left/right controllers
//! as line-delimited JSON, and analyzes such logs offline: zero-phase
//! low-pass filtering, dominant rotation axis selection, kick detection and
//! relative kick intensity.
//!
//! ```no_run
//! use joycon_imu::domain::{analysis::analyze_log, parser::parse_file, settings::AnalysisSettings};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let log = parse_file("logs/joycon_log_14_05_18_10_2026.json")?;
//! for (device, result) in analyze_log(&log, &AnalysisSettings::default()) {
//!     if let Ok(analysis) = result {
//!         println!("{} Joy-Con: {} kicks", device, analysis.kick_count());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

pub use error::{AcquisitionError, AnalysisError, Result};
