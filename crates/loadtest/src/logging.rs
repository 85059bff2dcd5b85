//! Tracing subscriber setup.

use std::io;

use clap::ValueEnum;
use tracing::{Subscriber, level_filters::LevelFilter};
use tracing_subscriber::{
    EnvFilter, Layer, fmt::time::SystemTime, layer::SubscriberExt, registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Full format with timestamp, level, target and spans.
    #[default]
    Full,
    /// Compact format with minimal metadata.
    Compact,
    /// JSON lines for log aggregation.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Default level, overridable through `RUST_LOG`.
    pub level: LevelFilter,
    /// Stdout format.
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: LevelFilter::INFO, format: LogFormat::Full }
    }
}

impl LogConfig {
    /// Maps a `-v` count to a config: none is `INFO`, then `DEBUG`, `TRACE`.
    pub const fn from_verbosity(verbosity: u8, format: LogFormat) -> Self {
        let level = match verbosity {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        };
        Self { level, format }
    }

    /// Initialize the tracing subscriber with the configured options.
    ///
    /// This sets the global default subscriber. Should only be called once.
    pub fn init_tracing_subscriber(&self) -> eyre::Result<()> {
        let filter =
            EnvFilter::builder().with_default_directive(self.level.into()).from_env_lossy();

        tracing_subscriber::registry()
            .with(filter)
            .with(build_stdout_layer(self.format))
            .try_init()
            .map_err(|e| eyre::eyre!("Failed to initialize tracing subscriber: {}", e))
    }
}

fn build_stdout_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + Send + Sync,
{
    let base = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(format != LogFormat::Json)
        .with_timer(SystemTime);

    match format {
        LogFormat::Full => Box::new(base),
        LogFormat::Compact => Box::new(base.compact()),
        LogFormat::Json => Box::new(base.json()),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, LevelFilter::INFO)]
    #[case(1, LevelFilter::DEBUG)]
    #[case(2, LevelFilter::TRACE)]
    #[case(7, LevelFilter::TRACE)]
    fn test_from_verbosity(#[case] verbosity: u8, #[case] expected: LevelFilter) {
        let config = LogConfig::from_verbosity(verbosity, LogFormat::Compact);
        assert_eq!(config.level, expected);
        assert_eq!(config.format, LogFormat::Compact);
    }

    #[test]
    fn test_log_format_value_enum() {
        assert_eq!(LogFormat::from_str("json", true).unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("full", true).unwrap(), LogFormat::Full);
        assert!(LogFormat::from_str("pretty", true).is_err());
    }
}
