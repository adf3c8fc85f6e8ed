//! Live view of an acquisition session
//!
//! Consumes [`AppEvent`]s from the polling loop, keeps a short per-device
//! history and echoes each reading to the console.

use crate::domain::models::{AppEvent, DeviceId, MessageSeverity, Sample};
use crate::presentation::history::LiveHistory;
use crate::presentation::render::PlotFrame;
use std::collections::BTreeMap;
use std::io::Write;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub fn format_motion(sample: &Sample) -> String {
    let (a, g) = (&sample.accel, &sample.gyro);
    format!(
        "[{} Joy-Con] Accel: X: {}, Y: {}, Z: {}    |    Gyro: X: {}, Y: {}, Z: {}",
        sample.device, a.x, a.y, a.z, g.x, g.y, g.z
    )
}

pub struct LiveMonitor<W: Write> {
    histories: BTreeMap<DeviceId, LiveHistory>,
    history_length: usize,
    echo: Option<W>,
    samples_seen: u64,
}

impl<W: Write> LiveMonitor<W> {
    /// `echo` receives one line per sample; `None` keeps the console quiet
    pub fn new(history_length: usize, echo: Option<W>) -> Self {
        Self {
            histories: BTreeMap::new(),
            history_length,
            echo,
            samples_seen: 0,
        }
    }

    pub fn handle(&mut self, event: AppEvent) {
        match event {
            AppEvent::Sample(sample) => {
                let history_length = self.history_length;
                self.histories
                    .entry(sample.device)
                    .or_insert_with(|| LiveHistory::new(history_length))
                    .push(&sample);
                self.samples_seen += 1;

                if let Some(out) = self.echo.as_mut() {
                    if let Err(e) = writeln!(out, "{}", format_motion(&sample)) {
                        warn!("Disabling sample echo: {}", e);
                        self.echo = None;
                    }
                }
            }
            AppEvent::Calibrated(device) => info!("{} Joy-Con calibrated", device),
            AppEvent::LogMessage(msg) => match msg.severity {
                MessageSeverity::Error => error!("{}", msg.message),
                MessageSeverity::Warning => warn!("{}", msg.message),
                MessageSeverity::Info | MessageSeverity::Success => info!("{}", msg.message),
            },
        }
    }

    /// Drain events until every sender is dropped
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<AppEvent>) -> Self {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        self
    }

    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    pub fn history(&self, device: DeviceId) -> Option<&LiveHistory> {
        self.histories.get(&device)
    }

    /// Current live frame per device that has reported anything
    pub fn frames(&self) -> Vec<PlotFrame> {
        self.histories
            .iter()
            .map(|(device, history)| {
                history.frame(
                    &format!("{}_live", device.as_str()),
                    &format!("{} Joy-Con (last {} samples)", device, history.len()),
                )
            })
            .collect()
    }
}
