//! Motion log parser
//!
//! Rebuilds per-device [`Series`] from a line-delimited JSON log. Lines that
//! are not motion records are skipped quietly; lines that cannot be read are
//! reported with a warning and counted, and parsing carries on.

use crate::domain::models::{DeviceId, Sample};
use crate::domain::records::LogLine;
use crate::domain::series::{Series, SeriesBuilder};
use crate::error::{AnalysisError, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of reading a whole log
#[derive(Debug, Default)]
pub struct ParsedLog {
    /// Only devices with at least one motion record have an entry
    pub series: BTreeMap<DeviceId, Series>,
    /// Malformed lines
    pub warnings: usize,
    /// Well-formed lines that carry no motion payload
    pub skipped: usize,
}

impl ParsedLog {
    pub fn device(&self, device: DeviceId) -> Option<&Series> {
        self.series.get(&device)
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

enum LineOutcome {
    Motion(Sample),
    Skipped,
}

fn parse_line(line_no: usize, line: &str) -> Result<LineOutcome> {
    let malformed = |reason: String| AnalysisError::MalformedRecord {
        line: line_no,
        reason,
    };

    let record: LogLine = serde_json::from_str(line).map_err(|e| malformed(e.to_string()))?;

    // Both a side and a non-empty motion object are needed
    let (Some(side), Some(motion)) = (record.joycon.as_deref(), record.motion_reading()) else {
        return Ok(LineOutcome::Skipped);
    };
    if side.is_empty() {
        return Ok(LineOutcome::Skipped);
    }

    let device = DeviceId::from_name(side)
        .ok_or_else(|| malformed(format!("unknown joycon side {:?}", side)))?;
    let motion = motion.map_err(|e| malformed(format!("bad motion payload: {}", e)))?;
    let timestamp = record
        .timestamp
        .ok_or_else(|| malformed("missing timestamp".to_string()))?;

    Ok(LineOutcome::Motion(Sample::new(timestamp, device, motion)))
}

/// Parse log lines into per-device series
pub fn parse_lines<I, S>(lines: I) -> ParsedLog
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    collect_series(lines.into_iter().map(Ok))
}

/// Lines arrive already decoded; an `Err` is a line that could not be
/// decoded and counts as malformed.
fn collect_series<I, S>(lines: I) -> ParsedLog
where
    I: IntoIterator<Item = Result<S>>,
    S: AsRef<str>,
{
    let mut builders: BTreeMap<DeviceId, SeriesBuilder> = BTreeMap::new();
    let mut parsed = ParsedLog::default();

    for (idx, line) in lines.into_iter().enumerate() {
        let line_no = idx + 1;
        let outcome = line.and_then(|line| {
            let line = line.as_ref().trim();
            if line.is_empty() {
                return Ok(None);
            }
            let sample = match parse_line(line_no, line)? {
                LineOutcome::Motion(sample) => sample,
                LineOutcome::Skipped => return Ok(Some(LineOutcome::Skipped)),
            };
            builders
                .entry(sample.device)
                .or_insert_with(|| SeriesBuilder::new(sample.device))
                .push(&sample)
                .map_err(|e| AnalysisError::MalformedRecord {
                    line: line_no,
                    reason: e.to_string(),
                })?;
            Ok(Some(LineOutcome::Motion(sample)))
        });

        match outcome {
            Ok(None) | Ok(Some(LineOutcome::Motion(_))) => {}
            Ok(Some(LineOutcome::Skipped)) => parsed.skipped += 1,
            Err(e) => {
                warn!("Skipping line: {}", e);
                parsed.warnings += 1;
            }
        }
    }

    parsed.series = builders
        .into_iter()
        .map(|(device, builder)| (device, builder.build()))
        .collect();

    debug!(
        "Parsed {} device series ({} skipped, {} malformed)",
        parsed.series.len(),
        parsed.skipped,
        parsed.warnings
    );
    parsed
}

/// Parse a motion log file from disk. Only failing to open or read the
/// file is an error; undecodable lines are counted like any malformed line.
pub fn parse_file(path: impl AsRef<Path>) -> Result<ParsedLog> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let mut lines = Vec::new();
    for (idx, chunk) in reader.split(b'\n').enumerate() {
        let decoded = String::from_utf8(chunk?).map_err(|e| AnalysisError::MalformedRecord {
            line: idx + 1,
            reason: format!("not valid UTF-8: {}", e),
        });
        lines.push(decoded);
    }
    Ok(collect_series(lines))
}
