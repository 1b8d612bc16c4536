//! Process-wide `tracing` bootstrap.
//!
//! Library crates only emit events through `tracing`; binaries and test
//! harnesses call [`init_tracing`] once to install a subscriber.

use std::sync::Once;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LogConfig;

/// Environment variable merged into the configured filter.
pub const LOG_ENV_VAR: &str = "JAVELIN_LOG";

static TRACING_INIT: Once = Once::new();

impl LogConfig {
    fn config_env_filter(&self) -> EnvFilter {
        let directives = Self::normalize_filter(&self.filter);
        EnvFilter::try_new(directives).unwrap_or_else(|_| {
            EnvFilter::default().add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// Create the effective `EnvFilter`.
    ///
    /// If `JAVELIN_LOG` is set, its directives are appended to the configured
    /// ones so they take precedence for overlapping targets.
    pub fn env_filter(&self) -> EnvFilter {
        let env_directives = std::env::var(LOG_ENV_VAR)
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_filter(&self.filter);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                EnvFilter::try_new(combined)
                    .or_else(|_| EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

/// Install the global subscriber.
///
/// Safe to call multiple times; only the first call has an effect. Returns
/// `true` when this call installed the subscriber.
pub fn init_tracing(config: &LogConfig) -> bool {
    let mut installed = false;
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();

        // `TestWriter` keeps output captured under `cargo test`.
        let layer: Box<dyn Layer<_> + Send + Sync> = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(tracing_subscriber::fmt::writer::TestWriter::with_stderr)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(tracing_subscriber::fmt::writer::TestWriter::with_stderr)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry().with(filter).with(layer);
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            installed = true;
            tracing::debug!(target: "javelin.config", filter = %config.filter, "tracing initialized");
        }
    });
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_idempotent() {
        let config = LogConfig::default();
        let _ = init_tracing(&config);
        assert!(!init_tracing(&config));
    }

    #[test]
    fn invalid_filter_falls_back_to_info() {
        let config = LogConfig {
            filter: "javelin=notalevel".to_owned(),
            json: false,
        };
        let filter = config.config_env_filter();
        assert_eq!(filter.max_level_hint(), Some(tracing_subscriber::filter::LevelFilter::INFO));
    }
}
