//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Library code only emits events; the subscriber is installed once here.
//! Logs always go to stderr so JSON on stdout stays parseable.
//!
//! Level precedence: `RUST_LOG`, then `-v` flags, then `[log] level` in
//! `.desk/config.toml`.

use std::io;

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::storage::{LogConfig, LogFormat};

/// Resolves the level from `-v` count, falling back to the configured level
pub fn level_for(verbosity: u8, configured: &str) -> Level {
    match verbosity {
        0 => configured.parse().unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Installs the global subscriber writing to stderr
pub fn init_logging(verbosity: u8, settings: &LogConfig) -> Result<()> {
    let level = level_for(verbosity, &settings.level);
    init_logging_with_writer(level, settings.format, io::stderr)
}

/// Installs the global subscriber with a custom writer
pub fn init_logging_with_writer<W>(level: Level, format: LogFormat, writer: W) -> Result<()>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = build_env_filter(level);

    let installed = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(writer)
                    .with_target(false)
                    .without_time(),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_writer(writer))
            .try_init(),
    };

    installed.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

/// Builds an `EnvFilter` for `level`, letting `RUST_LOG` override it
fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Dependencies stay at warn
        EnvFilter::new(format!(
            "warn,contract_desk={level}",
            level = level.as_str().to_lowercase()
        ))
    })
}
