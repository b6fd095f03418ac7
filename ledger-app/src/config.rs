//! Configuration loading from environment.

use std::env;
use std::str::FromStr;

use ledger_service::RetryPolicy;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://ledger.db?mode=rwc";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("Unknown LOG_FORMAT: {}. Supported: pretty, json", other),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub retry: RetryPolicy,
    pub webhook_url: Option<String>,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let retry = match lookup("LEDGER_MAX_ATTEMPTS") {
            Some(raw) => RetryPolicy::new(raw.trim().parse().map_err(|e| {
                anyhow::anyhow!("LEDGER_MAX_ATTEMPTS must be a positive integer: {}", e)
            })?),
            None => RetryPolicy::default(),
        };

        let webhook_url = lookup("LEDGER_WEBHOOK_URL").filter(|url| !url.trim().is_empty());

        let log_format = lookup("LOG_FORMAT")
            .map(|raw| raw.parse())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            database_url,
            retry,
            webhook_url,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.webhook_url.is_none());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "memory://"),
            ("LEDGER_MAX_ATTEMPTS", "5"),
            ("LEDGER_WEBHOOK_URL", "http://localhost:9000/notices"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.database_url, "memory://");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("http://localhost:9000/notices")
        );
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_blank_webhook_is_unset() {
        let config = load(&[("LEDGER_WEBHOOK_URL", "  ")]).unwrap();
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(load(&[("LEDGER_MAX_ATTEMPTS", "many")]).is_err());
        assert!(load(&[("LOG_FORMAT", "xml")]).is_err());
    }
}
