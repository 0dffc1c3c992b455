//! Logging and tracing utilities

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, LogFormat};

/// Initialize tracing subscriber with default configuration
///
/// `RUST_LOG` wins when set; otherwise everything at `info` and above is shown.
pub fn init_tracing() {
    init_tracing_with(&Config::default());
}

/// Initialize tracing subscriber from an application [`Config`]
///
/// Calling this more than once is harmless: later calls leave the first
/// subscriber in place.
pub fn init_tracing_with(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };

    match result {
        Ok(()) => tracing::info!(
            app = %config.app_name,
            environment = %config.environment,
            filter = %config.log_filter,
            "tracing initialized"
        ),
        Err(_) => tracing::debug!("tracing subscriber already installed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_does_not_panic() {
        let config = Config {
            log_filter: "debug".to_string(),
            environment: "test".to_string(),
            ..Config::default()
        }
        .with_app_name("advisor-test");
        init_tracing_with(&config);
        init_tracing_with(&config);
    }
}
