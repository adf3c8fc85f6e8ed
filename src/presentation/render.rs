//! Plot-ready frames and the renderers that consume them
//!
//! The analysis never draws anything itself. It hands a [`PlotFrame`] (a
//! shared x axis, named traces aligned to it, and optional event markers)
//! to a [`Renderer`].

use crate::domain::analysis::DeviceAnalysis;
use crate::domain::series::Series;
use anyhow::Result;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedSeries {
    pub name: String,
    pub values: Vec<f64>,
}

impl NamedSeries {
    pub fn new(name: &str, values: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }
}

/// A discrete overlay point, e.g. one detected kick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventMarker {
    pub index: usize,
    pub time_sec: f64,
    /// Signal value at the marker, for placing it on the trace
    pub signal: f64,
    /// Derived score shown next to the marker
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotFrame {
    /// Stable identifier, used for file names
    pub id: String,
    pub title: String,
    pub x_label: String,
    pub x: Vec<f64>,
    pub series: Vec<NamedSeries>,
    pub markers: Vec<EventMarker>,
}

impl PlotFrame {
    /// Dominant-axis angular velocity with one marker per kick
    pub fn kicks(analysis: &DeviceAnalysis) -> Self {
        let signal = analysis.dominant_signal();
        let magnitude: Vec<f64> = (0..analysis.gyro.len())
            .map(|i| {
                let (x, y, z) = (analysis.gyro.x[i], analysis.gyro.y[i], analysis.gyro.z[i]);
                (x * x + y * y + z * z).sqrt()
            })
            .collect();

        let markers = analysis
            .events
            .iter()
            .map(|e| EventMarker {
                index: e.index,
                time_sec: e.time_sec,
                signal: signal[e.index],
                value: e.intensity_pct,
            })
            .collect();

        Self {
            id: format!("{}_kicks", analysis.device.as_str()),
            title: format!(
                "{} Joy-Con: number of kicks {}",
                analysis.device,
                analysis.kick_count()
            ),
            x_label: "Time (s)".to_string(),
            x: analysis.time_sec.clone(),
            series: vec![
                NamedSeries::new(
                    &format!("Gyro {} (rad/s)", analysis.dominant_axis),
                    signal.to_vec(),
                ),
                NamedSeries::new("Gyro magnitude (rad/s)", magnitude),
            ],
            markers,
        }
    }

    /// Unfiltered accelerometer and gyroscope traces
    pub fn raw_motion(series: &Series) -> Self {
        let accel = series.accel();
        let gyro = series.gyro();
        Self {
            id: format!("{}_raw", series.device().as_str()),
            title: format!("{} Joy-Con Motion Data", series.device()),
            x_label: "Time (s)".to_string(),
            x: series.time_sec(),
            series: vec![
                NamedSeries::new("Accel X", accel.x.clone()),
                NamedSeries::new("Accel Y", accel.y.clone()),
                NamedSeries::new("Accel Z", accel.z.clone()),
                NamedSeries::new("Gyro X", gyro.x.clone()),
                NamedSeries::new("Gyro Y", gyro.y.clone()),
                NamedSeries::new("Gyro Z", gyro.z.clone()),
            ],
            markers: Vec::new(),
        }
    }

    /// Every trace has one value per x position and markers point inside
    pub fn is_consistent(&self) -> bool {
        let n = self.x.len();
        self.series.iter().all(|s| s.values.len() == n) && self.markers.iter().all(|m| m.index < n)
    }
}

pub trait Renderer {
    fn render(&mut self, frame: &PlotFrame) -> Result<()>;
}

/// Plain-text report of a frame: title, extent and one bar per marker
pub struct SummaryRenderer<W: Write> {
    out: W,
}

impl<W: Write> SummaryRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for SummaryRenderer<W> {
    fn render(&mut self, frame: &PlotFrame) -> Result<()> {
        writeln!(self.out, "{}", frame.title)?;
        let duration = frame.x.last().copied().unwrap_or(0.0);
        writeln!(
            self.out,
            "  {} points over {:.2} s, traces: {}",
            frame.x.len(),
            duration,
            frame
                .series
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )?;

        for marker in &frame.markers {
            let bar = "#".repeat((marker.value / 5.0).round() as usize);
            writeln!(
                self.out,
                "  {:>8.2} s  {:>4.0}%  {}",
                marker.time_sec, marker.value, bar
            )?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Writes each frame as pretty JSON to `<dir>/<frame id>.json`
pub struct JsonPlotExporter {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl JsonPlotExporter {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            written: Vec::new(),
        })
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl Renderer for JsonPlotExporter {
    fn render(&mut self, frame: &PlotFrame) -> Result<()> {
        if !frame.is_consistent() {
            return Err(anyhow::anyhow!("Plot frame {} has misaligned traces", frame.id));
        }
        let path = self.dir.join(format!("{}.json", frame.id));
        let json = serde_json::to_string_pretty(frame)?;
        fs::write(&path, json)?;
        info!("Wrote plot data to {}", path.display());
        self.written.push(path);
        Ok(())
    }
}
