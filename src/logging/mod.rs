//! Logging setup for the picker driver
//!
//! Logs go to stderr so that stdout stays reserved for host notifications.
//! File logging is optional and writes JSON lines through a non-blocking,
//! rotating appender.
//!
//! Precedence for the filter: RUST_LOG env var > config file > default "info".

use crate::config::{LogRotation, LoggingConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log files are named `citepick.<date>`
const LOG_FILE_PREFIX: &str = "citepick";

/// Filter directive used when RUST_LOG is not set
pub fn default_directive(config: &LoggingConfig) -> String {
    format!("citation_picker={level},citepick={level}", level = config.level)
}

/// Install the global subscriber
///
/// The returned guard must be kept alive for the duration of the program so
/// buffered file logs are flushed.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let Some(dir) = &config.dir else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        return None;
    };

    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Warning: Could not create log directory {:?}: {}", dir, e);
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        return None;
    }

    let file_appender = match config.rotation {
        LogRotation::Hourly => tracing_appender::rolling::hourly(dir, LOG_FILE_PREFIX),
        LogRotation::Daily => tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX),
        LogRotation::Never => tracing_appender::rolling::never(dir, LOG_FILE_PREFIX),
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_covers_library_and_binary() {
        let config = LoggingConfig {
            level: "debug".into(),
            ..Default::default()
        };
        assert_eq!(
            default_directive(&config),
            "citation_picker=debug,citepick=debug"
        );
    }

    #[test]
    fn test_default_directive_parses() {
        let directive = default_directive(&LoggingConfig::default());
        assert!(EnvFilter::try_new(directive).is_ok());
    }
}
