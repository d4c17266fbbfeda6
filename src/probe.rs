//! One-shot internet reachability check

use crate::config::ProbeConfig;
use crate::error::{Error, Result};
use crate::task::{TaskHandle, spawn_with_callback};
use reqwest::StatusCode;
use reqwest::header::CONNECTION;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Rewrite an `https://` URL to `http://`; other URLs pass through.
///
/// Only the scheme is touched. The probe uses this so that a certificate
/// problem on the probe host is not mistaken for "offline".
pub fn downgrade_https(url: &str) -> String {
    match url.get(..8) {
        Some(scheme) if scheme.eq_ignore_ascii_case("https://") => format!("http://{}", &url[8..]),
        _ => url.to_string(),
    }
}

fn head_accepts(status: StatusCode) -> bool {
    (200..=399).contains(&status.as_u16())
}

fn head_unsupported(status: StatusCode) -> bool {
    status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED
}

/// Checks whether a well-known endpoint answers
#[derive(Clone, Debug)]
pub struct ReachabilityProbe {
    client: reqwest::Client,
    config: ProbeConfig,
    runtime: Option<Handle>,
}

impl ReachabilityProbe {
    /// Create a probe with its own short-timeout HTTP client
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client cannot be created
    pub fn new(config: ProbeConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            runtime: None,
        })
    }

    /// Run callback-style checks on `runtime` instead of the ambient one
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// The URL that will actually be requested, after any scheme downgrade
    pub fn target_url(&self) -> String {
        if self.config.downgrade_https {
            downgrade_https(&self.config.url)
        } else {
            self.config.url.clone()
        }
    }

    /// Probe the configured endpoint.
    ///
    /// Sends a HEAD and accepts any 2xx or 3xx. If the endpoint rejects HEAD
    /// (405 or 501), retries once with GET and accepts only 2xx. Every failure,
    /// including timeouts, yields `false`.
    pub async fn check(&self) -> bool {
        let url = self.target_url();
        if url != self.config.url {
            warn!(from = %self.config.url, to = %url, "probing over plain http");
        }

        let head = self
            .client
            .head(&url)
            .header(CONNECTION, "close")
            .send()
            .await;

        let status = match head {
            Ok(response) => response.status(),
            Err(e) => {
                debug!(url = %url, error = %e, "reachability probe failed");
                return false;
            }
        };

        if head_accepts(status) {
            return true;
        }
        if !head_unsupported(status) {
            debug!(url = %url, status = status.as_u16(), "probe endpoint answered with failure");
            return false;
        }

        debug!(url = %url, "HEAD not supported, probing with GET");
        match self.client.get(&url).header(CONNECTION, "close").send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(url = %url, error = %e, "reachability probe failed");
                false
            }
        }
    }

    /// Probe in the background and hand the result to `on_complete`.
    ///
    /// Cancelling through the returned handle reports `false`.
    pub fn check_with_callback<F>(&self, on_complete: F) -> TaskHandle
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let probe = self.clone();
        spawn_with_callback(
            self.runtime.as_ref(),
            async move { probe.check().await },
            on_complete,
            || false,
            |_| false,
            || false,
        )
    }

    /// HEAD `url` with the https→http downgrade applied; 200..=399 is reachable.
    pub async fn ping(url: &str, timeout: Duration) -> bool {
        let config = ProbeConfig {
            url: url.to_string(),
            connect_timeout: timeout,
            timeout,
            downgrade_https: true,
            ..ProbeConfig::default()
        };
        match Self::new(config) {
            Ok(probe) => probe.check().await,
            Err(e) => {
                debug!(error = %e, "could not build probe client");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downgrade_rewrites_only_https_scheme() {
        assert_eq!(downgrade_https("https://example.com/x"), "http://example.com/x");
        assert_eq!(downgrade_https("HTTPS://example.com"), "http://example.com");
        assert_eq!(downgrade_https("http://https.example.com"), "http://https.example.com");
        assert_eq!(downgrade_https("ftp://h"), "ftp://h");
        assert_eq!(downgrade_https("h"), "h");
    }

    #[test]
    fn target_url_respects_downgrade_flag() {
        let config = ProbeConfig {
            url: "https://example.com".into(),
            downgrade_https: false,
            ..ProbeConfig::default()
        };
        let probe = ReachabilityProbe::new(config).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(probe.target_url(), "https://example.com");
    }

    #[test]
    fn head_status_classification() {
        assert!(head_accepts(StatusCode::OK));
        assert!(head_accepts(StatusCode::MOVED_PERMANENTLY));
        assert!(!head_accepts(StatusCode::NOT_FOUND));
        assert!(head_unsupported(StatusCode::METHOD_NOT_ALLOWED));
        assert!(!head_unsupported(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let zero = ProbeConfig {
            timeout: Duration::ZERO,
            ..ProbeConfig::default()
        };
        assert!(matches!(
            ReachabilityProbe::new(zero),
            Err(Error::Config { .. })
        ));

        let blank = ProbeConfig {
            url: " ".into(),
            ..ProbeConfig::default()
        };
        assert!(ReachabilityProbe::new(blank).is_err());
    }
}
