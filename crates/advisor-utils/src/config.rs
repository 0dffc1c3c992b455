//! Configuration management utilities

use serde::{Deserialize, Serialize};

/// Environment variable naming the deployment environment
pub const ENVIRONMENT_VAR: &str = "ADVISOR_ENV";

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (dev, prod, etc.)
    pub environment: String,
    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset
    pub log_filter: String,
    /// Log line format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "stock-advisor".to_string(),
            environment: "development".to_string(),
            log_filter: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Defaults, with the environment taken from `ADVISOR_ENV` when set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(environment) = lookup(ENVIRONMENT_VAR).filter(|v| !v.trim().is_empty()) {
            config.environment = environment.trim().to_string();
        }
        config
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    /// Raise the fallback filter to debug output for our own crates
    pub fn verbose(mut self) -> Self {
        self.log_filter = "info,advisor_engine=debug,advisor=debug".to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.app_name, "stock-advisor");
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"log_format": "json"}"#).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_environment_from_lookup() {
        let config = Config::from_lookup(|key| {
            (key == ENVIRONMENT_VAR).then(|| " production ".to_string())
        });
        assert_eq!(config.environment, "production");

        let config = Config::from_lookup(|_| Some(String::new()));
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_verbose() {
        let config = Config::default().verbose();
        assert!(config.log_filter.contains("advisor_engine=debug"));
    }
}
