//! # feedfields
//!
//! Fetch a feed-like XML document over HTTP and pull selected leaf elements
//! out of it as records.
//!
//! Feeds such as RSS repeat the same child elements under every item. Ask for
//! `["title", "link"]` and the n-th record holds the n-th `<title>` and the
//! n-th `<link>` found in the document.
//!
//! ## Pipeline
//!
//! request → HTTP GET (optional Basic auth) → strip `&...;` entities →
//! `no results` sentinel check → tokenize → extract fields → zip into records
//! → completion callback.
//!
//! ## Quick Start
//!
//! ```no_run
//! use feedfields::{FeedClient, FetchConfig, FetchRequest, FieldSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FeedClient::new(FetchConfig::default())?;
//!
//!     let request = FetchRequest::new("https://example.com/feed.xml")?
//!         .with_credentials("user", "secret")
//!         .with_fields(FieldSpec::new(["title", "link"])?);
//!
//!     let records = client.spawn(request).outcome().await?;
//!     for record in &records {
//!         println!("{:?} -> {:?}", record.get("title"), record.get("link"));
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Event-driven field extraction
pub mod extract;
/// HTTP fetch pipeline
pub mod fetch;
/// Reachability probe
pub mod probe;
/// Body sanitization
pub mod sanitize;
/// Background execution and completion delivery
pub mod task;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{Config, FetchConfig, ProbeConfig};
pub use error::{Error, Result};
pub use extract::{EventSource, FieldExtractor, XmlEvent};
pub use fetch::FeedFetcher;
pub use probe::ReachabilityProbe;
pub use task::{FeedClient, PendingFetch, TaskHandle};
pub use types::{Credentials, FetchOutcome, FetchRequest, FieldSpec, Record, RecordSet};
