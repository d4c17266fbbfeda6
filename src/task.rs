//! Background execution of fetches with completion callbacks
//!
//! [`FeedClient`] is the entry point most callers want. Each fetch runs as its
//! own tokio task; the caller gets a handle back immediately and the outcome is
//! delivered exactly once, either to a callback or through [`PendingFetch`].
//!
//! # Example
//!
//! ```no_run
//! use feedfields::{FeedClient, FetchConfig, FetchRequest, FieldSpec};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = FeedClient::new(FetchConfig::default())?;
//! let request = FetchRequest::new("https://example.com/rss")?
//!     .with_fields(FieldSpec::new(["title", "link"])?);
//!
//! client.fetch_with_callback(request, |outcome| match outcome {
//!     Ok(records) => println!("{} records", records.len()),
//!     Err(e) => eprintln!("fetch failed: {e}"),
//! });
//! # Ok(())
//! # }
//! ```

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::fetch::FeedFetcher;
use crate::types::{FetchOutcome, FetchRequest};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle to one background task
///
/// Dropping the handle does not stop the task; call [`cancel`](Self::cancel)
/// for that.
#[derive(Debug)]
pub struct TaskHandle {
    cancel_token: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl TaskHandle {
    fn spawned(cancel_token: CancellationToken, join: JoinHandle<()>) -> Self {
        Self {
            cancel_token,
            join: Some(join),
        }
    }

    /// A handle for work that completed inline (no runtime was available)
    fn completed() -> Self {
        Self {
            cancel_token: CancellationToken::new(),
            join: None,
        }
    }

    /// Ask the task to stop. Its completion callback still runs, once.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// True once cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// True once the task, including its callback, has finished
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the task, including its callback, to finish
    ///
    /// # Errors
    /// Returns [`Error::TaskFailed`] if the task panicked or was aborted
    pub async fn wait(self) -> Result<()> {
        match self.join {
            Some(join) => join.await.map_err(|e| Error::TaskFailed(e.to_string())),
            None => Ok(()),
        }
    }
}

/// Spawn `work` on `runtime`, or on the ambient runtime if none is given.
///
/// `on_complete` receives whatever `work` produces, or `on_cancel()` if the
/// token fires first, or `on_panic(message)` if `work` panics. When no
/// runtime exists it is called inline with `on_missing_runtime()`. Whichever
/// path is taken, it is called exactly once.
pub(crate) fn spawn_with_callback<T, W, F>(
    runtime: Option<&Handle>,
    work: W,
    on_complete: F,
    on_cancel: fn() -> T,
    on_panic: fn(String) -> T,
    on_missing_runtime: fn() -> T,
) -> TaskHandle
where
    T: Send + 'static,
    W: Future<Output = T> + Send + 'static,
    F: FnOnce(T) + Send + 'static,
{
    let Some(runtime) = runtime.cloned().or_else(|| Handle::try_current().ok()) else {
        debug!("no tokio runtime, completing inline");
        on_complete(on_missing_runtime());
        return TaskHandle::completed();
    };

    let cancel_token = CancellationToken::new();
    let child = cancel_token.clone();

    let join = runtime.spawn(async move {
        let guarded = AssertUnwindSafe(work).catch_unwind();
        let output = tokio::select! {
            biased;
            _ = child.cancelled() => on_cancel(),
            result = guarded => {
                result.unwrap_or_else(|panic| on_panic(panic_message(panic.as_ref())))
            }
        };
        on_complete(output);
    });

    TaskHandle::spawned(cancel_token, join)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}

/// A fetch running in the background whose outcome can be awaited
#[derive(Debug)]
pub struct PendingFetch {
    handle: TaskHandle,
    outcome: oneshot::Receiver<FetchOutcome>,
}

impl PendingFetch {
    /// Ask the fetch to stop; [`outcome`](Self::outcome) then yields [`Error::Cancelled`]
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// True once the outcome is available
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the full outcome
    pub async fn outcome(self) -> FetchOutcome {
        self.outcome.await.unwrap_or_else(|_| {
            Err(Error::TaskFailed(
                "fetch task ended without an outcome".into(),
            ))
        })
    }
}

/// Runs fetches in the background and reports their outcomes
///
/// Cloning is cheap; clones share one HTTP client. Concurrent fetches never
/// share extraction state.
#[derive(Clone, Debug)]
pub struct FeedClient {
    fetcher: Arc<FeedFetcher>,
    runtime: Option<Handle>,
}

impl FeedClient {
    /// Create a client with its own HTTP connection pool
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client cannot be created
    pub fn new(config: FetchConfig) -> Result<Self> {
        Ok(Self::from_fetcher(FeedFetcher::new(config)?))
    }

    /// Wrap an existing fetcher
    pub fn from_fetcher(fetcher: FeedFetcher) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            runtime: None,
        }
    }

    /// Run background fetches on `runtime` instead of the ambient one.
    ///
    /// Lets callers outside any tokio context (plain threads, UI loops) hand
    /// work to a runtime they own.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// The underlying fetcher
    pub fn fetcher(&self) -> &FeedFetcher {
        &self.fetcher
    }

    /// Fetch in the current task and return the outcome
    pub async fn fetch(&self, request: &FetchRequest) -> FetchOutcome {
        self.fetcher.fetch(request).await
    }

    /// Fetch in the background and hand the outcome to `on_complete`.
    ///
    /// Returns immediately. `on_complete` runs exactly once, on the runtime's
    /// worker, after the full record set or the failure is known. Cancelling
    /// through the returned handle delivers [`Error::Cancelled`].
    pub fn fetch_with_callback<F>(&self, request: FetchRequest, on_complete: F) -> TaskHandle
    where
        F: FnOnce(FetchOutcome) + Send + 'static,
    {
        let fetcher = Arc::clone(&self.fetcher);
        let work = async move { fetcher.fetch(&request).await };

        spawn_with_callback(
            self.runtime.as_ref(),
            work,
            on_complete,
            || Err(Error::Cancelled),
            |message| Err(Error::TaskFailed(message)),
            || Err(Error::NoRuntime),
        )
    }

    /// Fetch in the background and return a handle to await the outcome
    pub fn spawn(&self, request: FetchRequest) -> PendingFetch {
        let (tx, rx) = oneshot::channel();
        let handle = self.fetch_with_callback(request, move |outcome| {
            // receiver may already be gone; nobody is left to tell
            let _ = tx.send(outcome);
        });
        PendingFetch {
            handle,
            outcome: rx,
        }
    }
}
