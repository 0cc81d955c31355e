//! Pipeline stages between the controller and the external services.
//!
//! Every stage sends its service calls through the queue that owns the
//! service's rate budget, and degrades failures to an empty value with a
//! warning. The controller therefore never sees an upstream error.

pub mod enricher;
pub mod genre_feed;
pub mod resolver;
pub mod similarity;

pub use enricher::CatalogEnricher;
pub use genre_feed::GenreFeedFetcher;
pub use resolver::{MbidResolver, Resolution, ResolutionSource};
pub use similarity::{SimilarityFetcher, SimilarityOptions};

use crate::error::Result;
use crate::queue::RateLimitedQueue;
use std::future::Future;
use tracing::warn;

/// Swallow-and-log conversion of a failed call into its empty value.
pub(crate) trait Degrade<T> {
    fn degrade(self, operation: &str, subject: &str) -> T;
}

impl<T: Default> Degrade<T> for Result<T> {
    fn degrade(self, operation: &str, subject: &str) -> T {
        match self {
            Ok(value) => value,
            Err(e) => {
                warn!(operation, subject, error = %e, "Upstream call failed, continuing without it");
                T::default()
            }
        }
    }
}

/// Run a service call on `queue`, flattening queue and call errors.
pub(crate) async fn paced<T, F, Fut>(queue: &RateLimitedQueue, call: F) -> Result<T>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    queue.run(call).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExploreError;
    use std::time::Duration;

    #[test]
    fn test_degrade_passes_values_through() {
        let ok: Result<Vec<u8>> = Ok(vec![1, 2]);
        assert_eq!(ok.degrade("test", "subject"), vec![1, 2]);
    }

    #[test]
    fn test_degrade_yields_default_on_error() {
        let failed: Result<Option<String>> = Err(ExploreError::Http {
            status: 502,
            body: "Bad Gateway".to_string(),
        });
        assert_eq!(failed.degrade("artist lookup", "x"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paced_flattens_errors() {
        let queue = RateLimitedQueue::new("test", Duration::from_millis(5)).unwrap();

        let value = paced(&queue, || async { Ok::<_, ExploreError>(3) }).await.unwrap();
        assert_eq!(value, 3);

        let err = paced(&queue, || async {
            Err::<u8, _>(ExploreError::Network("reset".to_string()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ExploreError::Network(_)));
    }
}
