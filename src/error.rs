//! Error types for feedfields
//!
//! Every failure a fetch can hit (transport, status, timeout, tokenizer,
//! encoding, cancellation) is a variant of [`Error`]. The pipeline converts all
//! of them into the `Err` side of a [`FetchOutcome`](crate::types::FetchOutcome),
//! so callers only ever observe one delivery channel.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for feedfields operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for feedfields
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "fetch.read_timeout")
        key: Option<String>,
    },

    /// The request URL could not be parsed
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Transport failure (connection refused, DNS, TLS, body read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Numeric status code returned by the server
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// A bounded stage did not finish in time
    #[error("{stage} timed out after {after:?}")]
    Timeout {
        /// Which stage timed out ("response", "read")
        stage: &'static str,
        /// The configured bound that was exceeded
        after: Duration,
    },

    /// The tokenizer rejected the document
    #[error("malformed XML at byte {position}: {message}")]
    Xml {
        /// Description of the tokenizer failure
        message: String,
        /// Byte offset in the sanitized document where the failure was detected
        position: u64,
    },

    /// Body or element text was not valid UTF-8
    #[error("encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// The background fetch was cancelled before it completed
    #[error("fetch cancelled")]
    Cancelled,

    /// Background work was requested outside of a tokio runtime
    #[error("no tokio runtime available to run background work")]
    NoRuntime,

    /// The background task panicked or was aborted
    #[error("background task failed: {0}")]
    TaskFailed(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Machine-readable error code, stable across releases
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidUrl(_) => "invalid_url",
            Error::Network(_) => "network_error",
            Error::HttpStatus { .. } => "http_status",
            Error::Timeout { .. } => "timeout",
            Error::Xml { .. } => "malformed_xml",
            Error::Encoding(_) => "encoding_error",
            Error::Cancelled => "cancelled",
            Error::NoRuntime => "no_runtime",
            Error::TaskFailed(_) => "task_failed",
            Error::Other(_) => "internal_error",
        }
    }

    /// Returns true for failures that may succeed if the caller tries again.
    ///
    /// The fetch pipeline never retries on its own; this only classifies.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn all_error_variants() -> Vec<(Error, &'static str, bool)> {
        vec![
            (Error::config("must be > 0", "fetch.read_timeout"), "config_error", false),
            (
                Error::InvalidUrl(url::Url::parse("not a url").unwrap_err()),
                "invalid_url",
                false,
            ),
            (
                Error::HttpStatus {
                    status: 503,
                    url: "http://feed.test/rss".into(),
                },
                "http_status",
                true,
            ),
            (
                Error::HttpStatus {
                    status: 404,
                    url: "http://feed.test/rss".into(),
                },
                "http_status",
                false,
            ),
            (
                Error::Timeout {
                    stage: "read",
                    after: Duration::from_secs(20),
                },
                "timeout",
                true,
            ),
            (
                Error::Xml {
                    message: "unclosed tag".into(),
                    position: 12,
                },
                "malformed_xml",
                false,
            ),
            (
                Error::Encoding(String::from_utf8(vec![0xff, 0xfe]).unwrap_err()),
                "encoding_error",
                false,
            ),
            (Error::Cancelled, "cancelled", false),
            (Error::NoRuntime, "no_runtime", false),
            (Error::TaskFailed("panicked".into()), "task_failed", false),
            (Error::Other("boom".into()), "internal_error", false),
        ]
    }

    #[test]
    fn every_variant_has_expected_code_and_transience() {
        for (error, code, transient) in all_error_variants() {
            assert_eq!(error.error_code(), code, "wrong code for {error:?}");
            assert_eq!(
                error.is_transient(),
                transient,
                "wrong transience for {error:?}"
            );
        }
    }

    #[test]
    fn display_includes_context() {
        let err = Error::HttpStatus {
            status: 401,
            url: "http://feed.test/private".into(),
        };
        assert_eq!(err.to_string(), "HTTP 401 from http://feed.test/private");

        let err = Error::Xml {
            message: "unexpected end".into(),
            position: 40,
        };
        assert_eq!(err.to_string(), "malformed XML at byte 40: unexpected end");
    }

    #[test]
    fn config_helper_records_key() {
        match Error::config("empty", "probe.url") {
            Error::Config { message, key } => {
                assert_eq!(message, "empty");
                assert_eq!(key.as_deref(), Some("probe.url"));
            }
            other => panic!("expected Config, got {other:?}"),
        }
    }
}
