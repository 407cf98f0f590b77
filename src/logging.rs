use crate::config::{AppConfig, LogRotation};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Targets that are noisy at the service level
const QUIET_TARGETS: &[&str] = &["sqlx=warn", "hyper=info", "reqwest=info"];

fn file_appender(config: &AppConfig) -> RollingFileAppender {
    match config.rotation {
        LogRotation::Hourly => rolling::hourly(&config.log_dir, &config.log_file),
        LogRotation::Daily => rolling::daily(&config.log_dir, &config.log_file),
        LogRotation::Never => rolling::never(&config.log_dir, &config.log_file),
    }
}

fn default_filter(level: &str) -> String {
    std::iter::once(level)
        .chain(QUIET_TARGETS.iter().copied())
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber; RUST_LOG overrides `log_level`.
///
/// JSON mode writes only to the log file. Text mode also echoes to stdout.
/// Dropping the returned guard flushes and stops the file writer.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(file_appender(config));

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&config.log_level)));
    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(false)
                    .with_writer(writer)
                    .with_ansi(false),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(writer).with_ansi(false))
            .with(fmt::layer().with_target(false).with_ansi(true))
            .init();
    }

    guard
}
