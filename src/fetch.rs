//! Fetch pipeline: HTTP GET, entity stripping, sentinel check, extraction
//!
//! [`FeedFetcher::fetch`] runs the whole pipeline for one [`FetchRequest`]:
//!
//! 1. GET the URL, with an `Authorization: Basic` header when credentials are set
//! 2. Read the full body as UTF-8 (non-UTF-8 bytes are an [`Error::Encoding`])
//! 3. Delete entity references from it
//! 4. If what remains is the `no results` sentinel, return an empty record set
//! 5. Otherwise tokenize the stripped text and extract the requested fields
//!
//! Any failure on the way comes back as `Err`; a partially built record set is
//! never returned in its place.

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::extract::{FieldExtractor, XmlEvents};
use crate::sanitize::{is_no_results, strip_entities};
use crate::types::{FetchOutcome, FetchRequest, FieldSpec, RecordSet};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::AUTHORIZATION;
use tracing::{debug, warn};

/// Value for an `Authorization` header carrying HTTP Basic credentials.
///
/// Standard base64 with padding, on a single line.
pub fn basic_auth_header(username: &str, password: &str) -> String {
    let encoded = STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}

/// Sanitize a raw body and extract records from it.
///
/// This is the pipeline minus the network: strip entities, check the sentinel,
/// then tokenize and extract. The tokenizer is never started when the
/// sentinel matches.
pub fn parse_body(body: &str, fields: &FieldSpec, empty_body_is_no_results: bool) -> FetchOutcome {
    let stripped = strip_entities(body);

    if is_no_results(&stripped, empty_body_is_no_results) {
        debug!("response is the no-results sentinel");
        return Ok(RecordSet::empty());
    }

    let mut events = XmlEvents::from_bytes(stripped.as_bytes());
    FieldExtractor::new(fields.clone()).extract(&mut events)
}

/// Runs the fetch pipeline against one HTTP client
///
/// A fetcher keeps no per-request state, so a single instance (usually behind
/// an `Arc`) can serve any number of concurrent fetches.
#[derive(Clone, Debug)]
pub struct FeedFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl FeedFetcher {
    /// Create a fetcher with its own HTTP client
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client cannot be created
    pub fn new(config: FetchConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create a fetcher around an existing client.
    ///
    /// The client's own connect settings apply; `config` still bounds the
    /// response and body read.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid
    pub fn with_client(client: reqwest::Client, config: FetchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { client, config })
    }

    /// The configuration this fetcher runs with
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch `request` and extract its records
    pub async fn fetch(&self, request: &FetchRequest) -> FetchOutcome {
        let url = request.url();
        debug!(
            url = %url,
            authenticated = request.credentials().is_some(),
            fields = request.fields().len(),
            "fetching feed"
        );

        let result = match self.fetch_body(request).await {
            Ok(body) => parse_body(
                &body,
                request.fields(),
                self.config.empty_body_is_no_results,
            ),
            Err(e) => Err(e),
        };

        match &result {
            Ok(records) => debug!(url = %url, records = records.len(), "feed parsed"),
            Err(e) => warn!(url = %url, error = %e, "feed fetch failed"),
        }
        result
    }

    /// GET the request URL and return the body as text.
    ///
    /// Waiting for the response is bounded by connect + read timeout, reading
    /// the body by the read timeout. The connection is released on every path
    /// when the response is dropped.
    pub async fn fetch_body(&self, request: &FetchRequest) -> Result<String> {
        let url = request.url();
        let mut builder = self.client.get(url.clone());
        if let Some(credentials) = request.credentials() {
            builder = builder.header(
                AUTHORIZATION,
                basic_auth_header(&credentials.username, &credentials.password),
            );
        }

        let read_timeout = self.config.read_timeout;
        let response_timeout = self.config.connect_timeout + read_timeout;

        let response = tokio::time::timeout(response_timeout, builder.send())
            .await
            .map_err(|_| Error::Timeout {
                stage: "response",
                after: response_timeout,
            })??;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = tokio::time::timeout(read_timeout, response.bytes())
            .await
            .map_err(|_| Error::Timeout {
                stage: "read",
                after: read_timeout,
            })??;

        Ok(String::from_utf8(bytes.to_vec())?)
    }
}
