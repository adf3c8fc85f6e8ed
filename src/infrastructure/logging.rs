//! Tracing subscriber setup for the CLI

use crate::domain::settings::LogSettings;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Keeps the non-blocking file writer alive. Hold it until exit or the
/// last buffered lines are lost.
pub struct LoggingGuard {
    _file_writer: Option<WorkerGuard>,
}

fn rotation_from_name(name: &str) -> Rotation {
    match name.to_lowercase().as_str() {
        "hourly" => Rotation::HOURLY,
        "minutely" => Rotation::MINUTELY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

/// `RUST_LOG` first, then the `--verbose` override, then the settings file.
/// An unparsable directive falls back to `info`.
fn level_filter(settings: &LogSettings, level_override: Option<&str>) -> EnvFilter {
    let directive = level_override.unwrap_or(&settings.level);
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init_logger(settings: &LogSettings, level_override: Option<&str>) -> anyhow::Result<LoggingGuard> {
    // stderr, so summaries and sample echo on stdout can be piped
    let console_layer = settings.console_logging_enabled.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(settings.show_file_line)
            .with_line_number(settings.show_file_line)
            .with_thread_ids(settings.show_thread_ids)
            .with_target(settings.show_target)
            .with_ansi(settings.ansi_colors)
    });

    let mut file_writer = None;
    let file_layer = if settings.file_logging_enabled {
        fs::create_dir_all(&settings.log_dir)?;
        let appender = RollingFileAppender::new(
            rotation_from_name(&settings.rotation),
            &settings.log_dir,
            &settings.file_name_prefix,
        );
        let (writer, guard) = tracing_appender::non_blocking(appender);
        file_writer = Some(guard);
        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_file(settings.show_file_line)
                .with_line_number(settings.show_file_line)
                .with_thread_ids(settings.show_thread_ids)
                .with_target(settings.show_target),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(level_filter(settings, level_override))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::debug!(
        "Logging to {}{}",
        if settings.console_logging_enabled { "stderr" } else { "nowhere on console" },
        if settings.file_logging_enabled {
            format!(" and {}/{}.*", settings.log_dir, settings.file_name_prefix)
        } else {
            String::new()
        }
    );

    Ok(LoggingGuard {
        _file_writer: file_writer,
    })
}
