use anyhow::Result;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::LevelFilter,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::{LogFormat, LoggingConfig};

/// Console output plus two daily-rolling files in `config.directory`:
/// `combined.*.log` (everything) and `error.*.log` (errors only).
pub fn init_logger(config: &LoggingConfig) -> Result<()> {
    // Get log level from environment (default: info)
    let log_level = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,sms_ai_relay=debug".to_string());

    let combined_appender = rolling_appender(&config.directory, "combined")?;
    let error_appender = rolling_appender(&config.directory, "error")?;

    let filter = EnvFilter::try_new(&log_level)?;

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stdout)
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(combined_appender)
                        .with_target(true),
                )
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(error_appender)
                        .with_target(true)
                        .with_filter(LevelFilter::ERROR),
                )
                .init();
        }
        LogFormat::Pretty => {
            // Pretty format for development
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .pretty()
                        .with_writer(std::io::stdout)
                        .with_target(true),
                )
                .with(
                    fmt::layer()
                        .with_writer(combined_appender)
                        .with_ansi(false),
                )
                .with(
                    fmt::layer()
                        .with_writer(error_appender)
                        .with_ansi(false)
                        .with_filter(LevelFilter::ERROR),
                )
                .init();
        }
    }

    Ok(())
}

fn rolling_appender(directory: &str, prefix: &str) -> Result<RollingFileAppender> {
    Ok(RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(directory)?)
}
