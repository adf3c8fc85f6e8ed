//! Polling loop
//!
//! Every cycle reads each motion source once, handles the calibration
//! button, appends the readings to the motion log and publishes them as
//! [`AppEvent`]s. Cycles are paced by a [`Cadence`].

use crate::domain::models::{AppEvent, DeviceId, MessageSeverity, Sample, StatusMessage};
use crate::error::AcquisitionError;
use crate::infrastructure::motion_source::MotionSource;
use crate::infrastructure::recorder::MotionRecorder;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Fixed-interval scheduler that does not accumulate drift.
///
/// The deadline advances by exactly one interval per cycle. When a cycle
/// overruns past the next deadline, the deadline snaps to the current time
/// instead of trying to catch up with a burst of back-to-back polls.
#[derive(Debug, Clone)]
pub struct Cadence {
    interval: Duration,
    next_deadline: Instant,
}

impl Cadence {
    pub fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            next_deadline: start,
        }
    }

    pub fn from_rate_hz(rate_hz: f64, start: Instant) -> anyhow::Result<Self> {
        if !rate_hz.is_finite() || rate_hz <= 0.0 {
            return Err(anyhow::anyhow!("Poll rate must be positive, got {}", rate_hz));
        }
        Ok(Self::new(Duration::from_secs_f64(1.0 / rate_hz), start))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Call when a cycle has finished at `now`. Returns the time to sleep
    /// before the next cycle, or `None` when already late.
    pub fn next_sleep(&mut self, now: Instant) -> Option<Duration> {
        self.next_deadline += self.interval;
        if self.next_deadline > now {
            Some(self.next_deadline - now)
        } else {
            self.next_deadline = now;
            None
        }
    }
}

/// Rising-edge detector for the per-side calibration button
#[derive(Debug, Default)]
pub struct CalibrationLatch {
    held: HashMap<DeviceId, bool>,
}

impl CalibrationLatch {
    /// True only on the poll where the button goes from released to pressed
    pub fn update(&mut self, device: DeviceId, pressed: bool) -> bool {
        let was_held = self.held.insert(device, pressed).unwrap_or(false);
        pressed && !was_held
    }
}

/// Totals reported when the loop stops
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub cycles: u64,
    pub samples: u64,
    pub calibrations: u64,
}

type Clock = Box<dyn FnMut() -> i64 + Send>;

fn wall_clock_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct Acquisition {
    sources: Vec<Box<dyn MotionSource>>,
    recorder: MotionRecorder,
    event_sender: mpsc::UnboundedSender<AppEvent>,
    latch: CalibrationLatch,
    clock: Clock,
    summary: SessionSummary,
}

impl Acquisition {
    pub fn new(
        sources: Vec<Box<dyn MotionSource>>,
        recorder: MotionRecorder,
        event_sender: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            sources,
            recorder,
            event_sender,
            latch: CalibrationLatch::default(),
            clock: Box::new(wall_clock_ms),
            summary: SessionSummary::default(),
        }
    }

    /// Replace the wall clock used for record timestamps
    pub fn with_clock(mut self, clock: impl FnMut() -> i64 + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    fn send_log(&self, message: String, severity: MessageSeverity) {
        let _ = self
            .event_sender
            .send(AppEvent::LogMessage(StatusMessage { message, severity }));
    }

    /// Poll every source once
    pub fn poll_once(&mut self) -> Result<(), AcquisitionError> {
        for source in self.sources.iter_mut() {
            let device = source.device();
            let status = source.poll()?;
            let timestamp = (self.clock)();

            if self.latch.update(device, status.buttons.calibration_pressed(device)) {
                info!("Calibrating {} Joy-Con", device);
                source.calibrate(&status.motion());
                self.summary.calibrations += 1;
                let _ = self.event_sender.send(AppEvent::Calibrated(device));
            }

            self.recorder.record(timestamp, device, &status)?;
            self.summary.samples += 1;
            let _ = self
                .event_sender
                .send(AppEvent::Sample(Sample::new(timestamp, device, status.motion())));
        }
        self.recorder.flush()?;
        self.summary.cycles += 1;
        Ok(())
    }

    /// Poll at `rate_hz` until Ctrl-C, an acquisition error, or `max_cycles`
    pub async fn run(mut self, rate_hz: f64, max_cycles: Option<u64>) -> anyhow::Result<SessionSummary> {
        if self.sources.is_empty() {
            return Err(anyhow::anyhow!("No Joy-Cons connected"));
        }

        let mut cadence = Cadence::from_rate_hz(rate_hz, Instant::now())?;
        let started = format!("Polling {} Joy-Con(s) at {:.1} Hz", self.sources.len(), rate_hz);
        info!("{}", started);
        self.send_log(started, MessageSeverity::Info);
        let mut overrun_reported = false;

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            if let Err(e) = self.poll_once() {
                warn!("Acquisition stopped: {}", e);
                self.send_log(format!("Acquisition stopped: {}", e), MessageSeverity::Error);
                self.recorder.flush()?;
                return Err(e.into());
            }

            if max_cycles.is_some_and(|max| self.summary.cycles >= max) {
                break;
            }

            let pause = match cadence.next_sleep(Instant::now()) {
                Some(pause) => pause,
                None => {
                    debug!("Poll cycle overran {:?}, resynchronizing", cadence.interval());
                    if !overrun_reported {
                        overrun_reported = true;
                        self.send_log(
                            format!("Polling cannot keep up with {:.1} Hz", rate_hz),
                            MessageSeverity::Warning,
                        );
                    }
                    Duration::ZERO
                }
            };

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Logging stopped by user");
                    break;
                }
                _ = tokio::time::sleep(pause) => {}
            }
        }

        self.recorder.flush()?;
        if let Some(path) = self.recorder.path() {
            info!("Log saved to: {}", path.display());
        }
        self.send_log(
            format!("Recorded {} samples", self.summary.samples),
            MessageSeverity::Success,
        );
        Ok(self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::motion_source::SyntheticSource;

    #[test]
    fn test_cadence_sleeps_until_next_deadline() {
        let start = Instant::now();
        let mut cadence = Cadence::new(Duration::from_millis(20), start);
        assert_eq!(
            cadence.next_sleep(start + Duration::from_millis(5)),
            Some(Duration::from_millis(15))
        );
        // Deadline keeps advancing by the interval, not from when we woke up
        assert_eq!(
            cadence.next_sleep(start + Duration::from_millis(22)),
            Some(Duration::from_millis(18))
        );
    }

    #[test]
    fn test_cadence_resynchronizes_after_overrun() {
        let start = Instant::now();
        let mut cadence = Cadence::new(Duration::from_millis(20), start);
        assert_eq!(cadence.next_sleep(start + Duration::from_millis(100)), None);
        assert_eq!(
            cadence.next_sleep(start + Duration::from_millis(105)),
            Some(Duration::from_millis(15))
        );
    }

    #[test]
    fn test_cadence_rejects_bad_rate() {
        assert!(Cadence::from_rate_hz(0.0, Instant::now()).is_err());
        assert!(Cadence::from_rate_hz(f64::INFINITY, Instant::now()).is_err());
        let cadence = Cadence::from_rate_hz(50.0, Instant::now()).unwrap();
        assert_eq!(cadence.interval(), Duration::from_millis(20));
    }

    #[test]
    fn test_latch_fires_on_rising_edge_only() {
        let mut latch = CalibrationLatch::default();
        assert!(!latch.update(DeviceId::Left, false));
        assert!(latch.update(DeviceId::Left, true));
        assert!(!latch.update(DeviceId::Left, true));
        assert!(latch.update(DeviceId::Right, true));
        assert!(!latch.update(DeviceId::Left, false));
        assert!(latch.update(DeviceId::Left, true));
    }

    fn counting_clock() -> impl FnMut() -> i64 + Send {
        let mut now = 1_000;
        move || {
            now += 10;
            now
        }
    }

    #[test]
    fn test_poll_once_publishes_and_calibrates() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sources: Vec<Box<dyn MotionSource>> = vec![
            Box::new(SyntheticSource::new(DeviceId::Left, 50.0).with_button_press(0)),
            Box::new(SyntheticSource::new(DeviceId::Right, 50.0)),
        ];
        let mut acquisition =
            Acquisition::new(sources, MotionRecorder::disabled(), tx).with_clock(counting_clock());

        acquisition.poll_once().unwrap();
        acquisition.poll_once().unwrap();

        let mut samples = 0;
        let mut calibrated = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                AppEvent::Sample(_) => samples += 1,
                AppEvent::Calibrated(device) => calibrated.push(device),
                AppEvent::LogMessage(_) => {}
            }
        }
        assert_eq!(samples, 4);
        assert_eq!(calibrated, vec![DeviceId::Left]);
        assert_eq!(acquisition.summary.calibrations, 1);
        assert_eq!(acquisition.summary.cycles, 2);
    }

    #[tokio::test]
    async fn test_run_stops_after_cycle_budget() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sources: Vec<Box<dyn MotionSource>> =
            vec![Box::new(SyntheticSource::new(DeviceId::Left, 500.0))];
        let acquisition = Acquisition::new(sources, MotionRecorder::disabled(), tx);

        let summary = acquisition.run(500.0, Some(5)).await.unwrap();
        assert_eq!(summary.cycles, 5);
        assert_eq!(summary.samples, 5);

        let mut samples = 0;
        let mut severities = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                AppEvent::Sample(_) => samples += 1,
                AppEvent::LogMessage(msg) => severities.push(msg.severity),
                AppEvent::Calibrated(_) => {}
            }
        }
        assert_eq!(samples, 5);
        assert_eq!(severities.first(), Some(&MessageSeverity::Info));
        assert_eq!(severities.last(), Some(&MessageSeverity::Success));
    }

    #[tokio::test]
    async fn test_run_surfaces_unavailable_device() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let sources: Vec<Box<dyn MotionSource>> = vec![Box::new(
            SyntheticSource::new(DeviceId::Right, 500.0).with_disconnect_after(3),
        )];
        let acquisition = Acquisition::new(sources, MotionRecorder::disabled(), tx);

        let err = acquisition.run(500.0, None).await.unwrap_err();
        assert!(err.to_string().contains("Right Joy-Con is unavailable"));
    }

    #[tokio::test]
    async fn test_run_without_sources_fails() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let acquisition = Acquisition::new(Vec::new(), MotionRecorder::disabled(), tx);
        assert!(acquisition.run(50.0, Some(1)).await.is_err());
    }
}
