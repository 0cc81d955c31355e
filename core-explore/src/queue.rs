//! # Rate-Limited Request Queue
//!
//! Serializes calls against one external rate budget.
//!
//! Each queue owns a single worker task fed through an unbounded channel.
//! The worker runs jobs strictly one at a time in arrival order and, before
//! starting a job, waits until `min_spacing` has elapsed since the previous
//! job *started*. Handles are cheap to clone; every clone feeds the same
//! worker, so MusicBrainz resolution and ListenBrainz similarity share one
//! budget by sharing one handle.
//!
//! A failing or panicking operation only affects its own caller. There is no
//! retry, timeout or priority here.
//!
//! ```ignore
//! let queue = RateLimitedQueue::new("metabrainz", Duration::from_secs(1))?;
//! let candidates = queue
//!     .run(move || async move { client.search_artists("Radiohead", 5).await })
//!     .await??;
//! ```

use crate::error::{ExploreError, Result};
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace};

type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Handle to a paced, single-flight operation queue.
#[derive(Clone)]
pub struct RateLimitedQueue {
    name: Arc<str>,
    min_spacing: Duration,
    sender: mpsc::UnboundedSender<Job>,
}

impl RateLimitedQueue {
    /// Spawn the worker on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::Config`] when called outside a Tokio runtime.
    pub fn new(name: impl Into<String>, min_spacing: Duration) -> Result<Self> {
        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            ExploreError::Config(format!("Request queue needs a Tokio runtime: {}", e))
        })?;

        let name: Arc<str> = Arc::from(name.into());
        let (sender, receiver) = mpsc::unbounded_channel();
        handle.spawn(run_worker(Arc::clone(&name), min_spacing, receiver));

        debug!(queue = %name, spacing_ms = min_spacing.as_millis() as u64, "Request queue started");

        Ok(Self {
            name,
            min_spacing,
            sender,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_spacing(&self) -> Duration {
        self.min_spacing
    }

    /// Enqueue `operation` and wait for its output.
    ///
    /// The operation is not started until every earlier operation on this
    /// queue has finished and the spacing has elapsed. Dropping the returned
    /// future does not withdraw the operation; its output is discarded.
    ///
    /// # Errors
    ///
    /// - [`ExploreError::OperationPanicked`] if the operation panicked
    /// - [`ExploreError::QueueClosed`] if the worker is gone
    pub async fn run<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, outcome) = oneshot::channel();
        let job: Job = Box::new(move || {
            async move {
                let result = AssertUnwindSafe(async move { operation().await })
                    .catch_unwind()
                    .await;
                // The caller may have stopped waiting.
                let _ = reply.send(result);
            }
            .boxed()
        });

        self.sender
            .send(job)
            .map_err(|_| ExploreError::QueueClosed(self.name.to_string()))?;

        match outcome.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(ExploreError::OperationPanicked(self.name.to_string())),
            Err(_) => Err(ExploreError::QueueClosed(self.name.to_string())),
        }
    }
}

impl std::fmt::Debug for RateLimitedQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedQueue")
            .field("name", &self.name)
            .field("min_spacing", &self.min_spacing)
            .finish()
    }
}

async fn run_worker(
    name: Arc<str>,
    min_spacing: Duration,
    mut receiver: mpsc::UnboundedReceiver<Job>,
) {
    let mut last_start: Option<Instant> = None;

    while let Some(job) = receiver.recv().await {
        if let Some(previous) = last_start {
            let ready_at = previous + min_spacing;
            if ready_at > Instant::now() {
                trace!(queue = %name, "Pacing next request");
                sleep_until(ready_at).await;
            }
        }

        last_start = Some(Instant::now());
        job().await;
    }

    debug!(queue = %name, "Request queue stopped");
}
