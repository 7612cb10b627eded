//! Logging setup for the `vellum` binary and embedding applications.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directives used when `RUST_LOG` is unset (e.g. "info", "vellum_storage=debug")
    pub log_level: String,
    /// Include the event target in each line
    pub with_target: bool,
}

impl LogConfig {
    /// Configuration logging at `info`.
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            with_target: false,
        }
    }

    /// Set the filter.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Show event targets.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `config.log_level` when set.
///
/// # Errors
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_tracing(config: LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(config.with_target)
                .with_level(true),
        )
        .try_init()?;

    Ok(())
}
