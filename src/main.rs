use anyhow::Result;
use clap::{Parser, Subcommand};
use joycon_imu::domain::analysis::analyze_log;
use joycon_imu::domain::models::DeviceId;
use joycon_imu::domain::parser::parse_file;
use joycon_imu::domain::settings::{LogMode, Settings, SettingsService};
use joycon_imu::infrastructure::acquisition::Acquisition;
use joycon_imu::infrastructure::logging::init_logger;
use joycon_imu::infrastructure::motion_source::{MotionSource, SyntheticSource};
use joycon_imu::infrastructure::recorder::{default_log_path, MotionRecorder};
use joycon_imu::presentation::monitor::LiveMonitor;
use joycon_imu::presentation::render::{JsonPlotExporter, PlotFrame, Renderer, SummaryRenderer};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Joy-Con motion logger and kick analyzer", long_about = None)]
struct Args {
    /// Settings file (JSON). Defaults to the user config directory.
    #[arg(short = 'C', long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll motion sources and write a motion log
    Record {
        /// Controllers to poll (left, right)
        #[arg(short, long = "device", default_values_t = vec!["left".to_string(), "right".to_string()])]
        devices: Vec<String>,

        /// Polling rate in Hz
        #[arg(long)]
        poll_rate: Option<f64>,

        /// What to log: motion, all or none
        #[arg(long)]
        log_mode: Option<String>,

        /// Log file path (default: <log_dir>/joycon_log_<timestamp>.json)
        #[arg(long)]
        log_path: Option<PathBuf>,

        /// Stop after this many poll cycles
        #[arg(long)]
        cycles: Option<u64>,

        /// Seconds between simulated kicks
        #[arg(long, default_value_t = 1.0)]
        kick_period: f64,

        /// Do not echo every reading
        #[arg(short, long)]
        quiet: bool,

        /// Export the final live history frames as JSON into this directory
        #[arg(long)]
        live_out: Option<PathBuf>,
    },

    /// Detect kicks in a motion log
    Analyze {
        /// Path to a Joy-Con motion log
        log_file: PathBuf,

        /// Low-pass cutoff in Hz
        #[arg(long)]
        cutoff: Option<f64>,

        /// Butterworth filter order
        #[arg(long)]
        order: Option<usize>,

        /// Declared sample rate in Hz (default: derived from timestamps)
        #[arg(long)]
        sample_rate: Option<f64>,

        /// Minimum kick peak in rad/s
        #[arg(long)]
        min_height: Option<f64>,

        /// Minimum seconds between kicks
        #[arg(long)]
        min_separation: Option<f64>,

        /// Write plot data as JSON into this directory
        #[arg(long)]
        plots_out: Option<PathBuf>,
    },

    /// Show the unfiltered accelerometer and gyroscope traces of a log
    PlotRaw {
        log_file: PathBuf,

        #[arg(long)]
        plots_out: Option<PathBuf>,
    },
}

fn load_settings(config: Option<&Path>) -> Result<SettingsService> {
    match config {
        Some(path) => SettingsService::from_file(path.to_path_buf()),
        None => SettingsService::new(),
    }
}

fn parse_devices(names: &[String]) -> Result<Vec<DeviceId>> {
    let mut devices = Vec::new();
    for name in names {
        let device = DeviceId::from_name(&name.to_lowercase())
            .ok_or_else(|| anyhow::anyhow!("Unknown Joy-Con side: {}", name))?;
        if !devices.contains(&device) {
            devices.push(device);
        }
    }
    Ok(devices)
}

fn render_all(frames: &[PlotFrame], plots_out: Option<&Path>) -> Result<()> {
    let mut summary = SummaryRenderer::new(std::io::stdout());
    let mut exporter = plots_out.map(JsonPlotExporter::new).transpose()?;

    for frame in frames {
        summary.render(frame)?;
        if let Some(exporter) = exporter.as_mut() {
            exporter.render(frame)?;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn record(
    settings: &Settings,
    devices: Vec<String>,
    poll_rate: Option<f64>,
    log_mode: Option<String>,
    log_path: Option<PathBuf>,
    cycles: Option<u64>,
    kick_period: f64,
    quiet: bool,
    live_out: Option<PathBuf>,
) -> Result<()> {
    let recorder_settings = &settings.recorder;
    let rate = poll_rate.unwrap_or(recorder_settings.poll_rate_hz);
    let mode = match log_mode {
        Some(mode) => mode.parse::<LogMode>()?,
        None => recorder_settings.log_mode,
    };
    let path = log_path.unwrap_or_else(|| {
        default_log_path(Path::new(&recorder_settings.log_dir), chrono::Local::now())
    });

    let sources: Vec<Box<dyn MotionSource>> = parse_devices(&devices)?
        .into_iter()
        .map(|device| {
            info!("{} Joy-Con connected (synthetic)", device);
            Box::new(SyntheticSource::new(device, rate).with_kick_period(kick_period)) as Box<dyn MotionSource>
        })
        .collect();

    let recorder = MotionRecorder::create(&path, mode)?;
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let echo = if quiet || !recorder_settings.print_samples {
        None
    } else {
        Some(std::io::stdout())
    };
    let monitor = LiveMonitor::new(recorder_settings.history_length, echo);
    let monitor_task = tokio::spawn(monitor.run(event_rx));

    let result = Acquisition::new(sources, recorder, event_tx).run(rate, cycles).await;

    // The acquisition owned the only sender, so the monitor finishes now
    let monitor = monitor_task.await?;
    let summary = result?;
    info!(
        "Session finished: {} cycles, {} samples, {} calibrations",
        summary.cycles, summary.samples, summary.calibrations
    );

    if let Some(dir) = live_out {
        let mut exporter = JsonPlotExporter::new(dir)?;
        for frame in monitor.frames() {
            exporter.render(&frame)?;
        }
    }
    Ok(())
}

fn analyze(settings: &Settings, log_file: &Path, plots_out: Option<&Path>) -> Result<()> {
    let log = parse_file(log_file)?;
    if log.warnings > 0 {
        warn!("{} malformed lines skipped", log.warnings);
    }
    if log.is_empty() {
        println!("No motion data found in the file.");
        return Ok(());
    }

    let mut frames = Vec::new();
    for (device, result) in analyze_log(&log, &settings.analysis) {
        match result {
            Ok(analysis) => frames.push(PlotFrame::kicks(&analysis)),
            Err(e) if e.is_empty_input() => println!("No motion data for {} Joy-Con.", device),
            Err(e) => println!("Skipping {} Joy-Con: {}", device, e),
        }
    }
    render_all(&frames, plots_out)
}

fn plot_raw(log_file: &Path, plots_out: Option<&Path>) -> Result<()> {
    let log = parse_file(log_file)?;
    if log.is_empty() {
        println!("No motion data found in the file.");
        return Ok(());
    }
    let frames: Vec<PlotFrame> = log.series.values().map(PlotFrame::raw_motion).collect();
    render_all(&frames, plots_out)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings_service = load_settings(args.config.as_deref())?;
    let mut settings = settings_service.get().clone();

    let _logging_guard = init_logger(
        &settings.log_settings,
        if args.verbose { Some("debug") } else { None },
    )?;
    match settings_service.fallback_reason() {
        Some(reason) => warn!(
            "Using default settings, {} not loaded: {}",
            settings_service.path().display(),
            reason
        ),
        None => info!("Settings: {}", settings_service.path().display()),
    }

    match args.command {
        Command::Record {
            devices,
            poll_rate,
            log_mode,
            log_path,
            cycles,
            kick_period,
            quiet,
            live_out,
        } => {
            record(
                &settings,
                devices,
                poll_rate,
                log_mode,
                log_path,
                cycles,
                kick_period,
                quiet,
                live_out,
            )
            .await
        }
        Command::Analyze {
            log_file,
            cutoff,
            order,
            sample_rate,
            min_height,
            min_separation,
            plots_out,
        } => {
            let analysis = &mut settings.analysis;
            if let Some(cutoff) = cutoff {
                analysis.cutoff_hz = cutoff;
            }
            if let Some(order) = order {
                analysis.filter_order = order;
            }
            if sample_rate.is_some() {
                analysis.sample_rate_hz = sample_rate;
            }
            if let Some(min_height) = min_height {
                analysis.peaks.min_height = min_height;
            }
            if let Some(min_separation) = min_separation {
                analysis.peaks.min_separation_sec = min_separation;
            }
            analyze(&settings, &log_file, plots_out.as_deref())
        }
        Command::PlotRaw { log_file, plots_out } => plot_raw(&log_file, plots_out.as_deref()),
    }
}
