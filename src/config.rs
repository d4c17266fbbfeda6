//! Configuration types for feedfields

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration
///
/// Every field has a default, so `Config::default()` and `{}` in JSON both
/// produce a working setup.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Feed fetching behaviour
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Reachability probe behaviour
    #[serde(default)]
    pub probe: ProbeConfig,
}

impl Config {
    /// Parse a JSON configuration document and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json).map_err(|e| Error::Config {
            message: format!("invalid configuration JSON: {e}"),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that can never produce a working fetch
    pub fn validate(&self) -> Result<()> {
        self.fetch.validate()?;
        self.probe.validate()
    }
}

/// Feed fetch configuration (timeouts, client identity, sentinel handling)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Bound on establishing the connection (default: 30 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_ms")]
    pub connect_timeout: Duration,

    /// Bound on receiving the response and reading the full body (default: 20 seconds)
    #[serde(default = "default_read_timeout", with = "duration_ms")]
    pub read_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Treat an empty (whitespace-only) body as the "no results" sentinel (default: true)
    ///
    /// Applies to anonymous and authenticated requests alike. When disabled, an
    /// empty body is handed to the tokenizer, which also yields zero records.
    #[serde(default = "default_true")]
    pub empty_body_is_no_results: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
            user_agent: default_user_agent(),
            empty_body_is_no_results: true,
        }
    }
}

impl FetchConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.connect_timeout.is_zero() {
            return Err(Error::config(
                "connect timeout must be greater than zero",
                "fetch.connect_timeout",
            ));
        }
        if self.read_timeout.is_zero() {
            return Err(Error::config(
                "read timeout must be greater than zero",
                "fetch.read_timeout",
            ));
        }
        Ok(())
    }
}

/// Reachability probe configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Well-known endpoint to probe (default: "http://www.google.com")
    #[serde(default = "default_probe_url")]
    pub url: String,

    /// Bound on establishing the connection (default: 500 milliseconds)
    #[serde(default = "default_probe_connect_timeout", with = "duration_ms")]
    pub connect_timeout: Duration,

    /// Bound on the whole probe request (default: 5 seconds)
    #[serde(default = "default_probe_timeout", with = "duration_ms")]
    pub timeout: Duration,

    /// Rewrite an `https` probe URL to `http` before probing (default: true)
    ///
    /// The probe only answers "is the network up", so a host with a broken
    /// certificate should still count as reachable. Every downgrade is logged
    /// at warn level.
    #[serde(default = "default_true")]
    pub downgrade_https: bool,

    /// User-Agent header sent with the probe
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            url: default_probe_url(),
            connect_timeout: default_probe_connect_timeout(),
            timeout: default_probe_timeout(),
            downgrade_https: true,
            user_agent: default_user_agent(),
        }
    }
}

impl ProbeConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::config("probe URL must not be empty", "probe.url"));
        }
        if self.timeout.is_zero() {
            return Err(Error::config(
                "probe timeout must be greater than zero",
                "probe.timeout",
            ));
        }
        Ok(())
    }
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_read_timeout() -> Duration {
    Duration::from_secs(20)
}

fn default_user_agent() -> String {
    format!("feedfields/{}", env!("CARGO_PKG_VERSION"))
}

fn default_true() -> bool {
    true
}

fn default_probe_url() -> String {
    "http://www.google.com".to_string()
}

fn default_probe_connect_timeout() -> Duration {
    Duration::from_millis(500)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(5)
}

// Duration serialization helper (integer milliseconds)
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.fetch.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.fetch.read_timeout, Duration::from_secs(20));
        assert!(config.fetch.empty_body_is_no_results);
        assert!(config.fetch.user_agent.starts_with("feedfields/"));

        assert_eq!(config.probe.url, "http://www.google.com");
        assert_eq!(config.probe.connect_timeout, Duration::from_millis(500));
        assert!(config.probe.downgrade_https);
    }

    #[test]
    fn empty_json_object_yields_defaults() {
        let config = Config::from_json_str("{}").expect("empty config should be valid");
        assert_eq!(config.fetch.read_timeout, Duration::from_secs(20));
        assert_eq!(config.probe.timeout, Duration::from_secs(5));
    }

    #[test]
    fn durations_are_read_as_milliseconds() {
        let json = r#"{
            "fetch": {"connect_timeout": 1500, "read_timeout": 250},
            "probe": {"timeout": 100}
        }"#;
        let config = Config::from_json_str(json).unwrap();
        assert_eq!(config.fetch.connect_timeout, Duration::from_millis(1500));
        assert_eq!(config.fetch.read_timeout, Duration::from_millis(250));
        assert_eq!(config.probe.timeout, Duration::from_millis(100));
    }

    #[test]
    fn serialization_round_trips_durations() {
        let mut config = Config::default();
        config.fetch.read_timeout = Duration::from_millis(1234);
        config.fetch.empty_body_is_no_results = false;

        let json = serde_json::to_string(&config).expect("serialize failed");
        let back = Config::from_json_str(&json).expect("deserialize failed");

        assert_eq!(back.fetch.read_timeout, Duration::from_millis(1234));
        assert!(!back.fetch.empty_body_is_no_results);
    }

    #[test]
    fn zero_read_timeout_is_rejected_with_key() {
        let err = Config::from_json_str(r#"{"fetch": {"read_timeout": 0}}"#).unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("fetch.read_timeout")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn blank_probe_url_is_rejected() {
        let err = Config::from_json_str(r#"{"probe": {"url": "  "}}"#).unwrap_err();
        assert_eq!(err.error_code(), "config_error");
    }

    #[test]
    fn malformed_json_is_config_error() {
        let err = Config::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::Config { key: None, .. }));
    }
}
