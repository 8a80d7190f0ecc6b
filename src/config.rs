//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Default pause before the assistant's next message appears.
pub const DEFAULT_REPLY_DELAY_MS: u64 = 500;

/// Default simulated latency of the mock account backend.
pub const DEFAULT_ACCOUNT_LATENCY_MS: u64 = 1500;

/// Closing message appended once the last question has been answered.
pub const DEFAULT_CLOSING_MESSAGE: &str = "Thank you for providing all the information. \
Our legal team will review your case and get back to you soon.";

/// Service configuration.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Port for the HTTP / WebSocket server.
    pub port: u16,
    /// Pacing delay before each assistant message.
    pub reply_delay: Duration,
    /// Reject answers outside a fixed-choice node's options.
    pub strict_options: bool,
    /// Optional JSON flow table replacing the built-in questionnaire.
    pub flow_path: Option<PathBuf>,
    /// Local file holding the signed-in mock user.
    pub account_path: PathBuf,
    /// Simulated latency of the mock account backend.
    pub account_latency: Duration,
    /// If set, finished sessions are POSTed here in addition to being logged.
    pub webhook_url: Option<String>,
    /// Run the stdin/stdout REPL alongside the server.
    pub cli_enabled: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            reply_delay: Duration::from_millis(DEFAULT_REPLY_DELAY_MS),
            strict_options: false,
            flow_path: None,
            account_path: default_account_path(),
            account_latency: Duration::from_millis(DEFAULT_ACCOUNT_LATENCY_MS),
            webhook_url: None,
            cli_enabled: false,
        }
    }
}

impl IntakeConfig {
    /// Build config from `LEGAL_INTAKE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = parse_or("LEGAL_INTAKE_PORT", &lookup, defaults.port)?;
        let reply_delay_ms = parse_or(
            "LEGAL_INTAKE_REPLY_DELAY_MS",
            &lookup,
            DEFAULT_REPLY_DELAY_MS,
        )?;
        let strict_options = parse_flag("LEGAL_INTAKE_STRICT_OPTIONS", &lookup)?;
        let account_latency_ms = parse_or(
            "LEGAL_INTAKE_ACCOUNT_LATENCY_MS",
            &lookup,
            DEFAULT_ACCOUNT_LATENCY_MS,
        )?;
        let cli_enabled = parse_flag("LEGAL_INTAKE_CLI", &lookup)?;

        let flow_path = non_empty(lookup("LEGAL_INTAKE_FLOW_PATH")).map(PathBuf::from);
        let account_path = non_empty(lookup("LEGAL_INTAKE_ACCOUNT_PATH"))
            .map(PathBuf::from)
            .unwrap_or(defaults.account_path);

        let webhook_url = non_empty(lookup("LEGAL_INTAKE_WEBHOOK_URL"));
        if let Some(ref url) = webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    key: "LEGAL_INTAKE_WEBHOOK_URL".to_string(),
                    message: format!("expected an http(s) URL, got '{url}'"),
                });
            }
        }

        Ok(Self {
            port,
            reply_delay: Duration::from_millis(reply_delay_ms),
            strict_options,
            flow_path,
            account_path,
            account_latency: Duration::from_millis(account_latency_ms),
            webhook_url,
            cli_enabled,
        })
    }
}

fn default_account_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".legal-intake/user.json")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup(key)) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_flag<F>(key: &str, lookup: &F) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = non_empty(lookup(key)) else {
        return Ok(false);
    };
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = IntakeConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.reply_delay, Duration::from_millis(500));
        assert!(!config.strict_options);
        assert!(config.flow_path.is_none());
        assert!(config.webhook_url.is_none());
        assert!(!config.cli_enabled);
    }

    #[tokio::test]
    async fn configured_flow_path_loads_table() {
        use crate::flow::{FlowTable, legal_intake_nodes};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legal.json");
        let json = serde_json::to_string(&legal_intake_nodes()).unwrap();
        tokio::fs::write(&path, json).await.unwrap();

        let config = IntakeConfig::from_lookup(lookup_from(&[(
            "LEGAL_INTAKE_FLOW_PATH",
            path.to_str().unwrap(),
        )]))
        .unwrap();
        let flow_path = config.flow_path.unwrap();
        assert_eq!(flow_path, path);

        let table = FlowTable::load(&flow_path).await.unwrap();
        assert_eq!(table.len(), 9);
        assert_eq!(table.entry().id, "start");
    }

    #[test]
    fn overrides_are_parsed() {
        let config = IntakeConfig::from_lookup(lookup_from(&[
            ("LEGAL_INTAKE_PORT", "9000"),
            ("LEGAL_INTAKE_REPLY_DELAY_MS", "0"),
            ("LEGAL_INTAKE_STRICT_OPTIONS", "yes"),
            ("LEGAL_INTAKE_FLOW_PATH", "/tmp/flow.json"),
            ("LEGAL_INTAKE_ACCOUNT_PATH", "/tmp/user.json"),
            ("LEGAL_INTAKE_WEBHOOK_URL", "https://example.com/intake"),
            ("LEGAL_INTAKE_CLI", "true"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.reply_delay, Duration::ZERO);
        assert!(config.strict_options);
        assert_eq!(config.flow_path, Some(PathBuf::from("/tmp/flow.json")));
        assert_eq!(config.account_path, PathBuf::from("/tmp/user.json"));
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("https://example.com/intake")
        );
        assert!(config.cli_enabled);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = IntakeConfig::from_lookup(lookup_from(&[("LEGAL_INTAKE_PORT", "eighty")]))
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "LEGAL_INTAKE_PORT"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_flag_is_rejected() {
        let result =
            IntakeConfig::from_lookup(lookup_from(&[("LEGAL_INTAKE_STRICT_OPTIONS", "maybe")]));
        assert!(result.is_err());
    }

    #[test]
    fn webhook_must_be_http() {
        let result =
            IntakeConfig::from_lookup(lookup_from(&[("LEGAL_INTAKE_WEBHOOK_URL", "ftp://x")]));
        assert!(result.is_err());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = IntakeConfig::from_lookup(lookup_from(&[
            ("LEGAL_INTAKE_PORT", "  "),
            ("LEGAL_INTAKE_FLOW_PATH", ""),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.flow_path.is_none());
    }
}
