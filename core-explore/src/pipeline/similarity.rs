//! Similar-artist lookup for a resolved seed.

use super::{paced, Degrade};
use crate::models::SimilarArtistRef;
use crate::queue::RateLimitedQueue;
use crate::services::SimilarityService;
use core_runtime::config::DEFAULT_SIMILARITY_ALGORITHM;
use std::sync::Arc;

pub const DEFAULT_SIMILAR_LIMIT: usize = 25;

/// Per-call overrides; `None` falls back to the fetcher's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimilarityOptions {
    pub limit: Option<usize>,
    pub algorithm: Option<String>,
}

pub struct SimilarityFetcher {
    service: Arc<dyn SimilarityService>,
    queue: RateLimitedQueue,
    default_limit: usize,
    default_algorithm: String,
}

impl SimilarityFetcher {
    pub fn new(service: Arc<dyn SimilarityService>, queue: RateLimitedQueue) -> Self {
        Self {
            service,
            queue,
            default_limit: DEFAULT_SIMILAR_LIMIT,
            default_algorithm: DEFAULT_SIMILARITY_ALGORITHM.to_string(),
        }
    }

    pub fn with_defaults(mut self, limit: usize, algorithm: impl Into<String>) -> Self {
        self.default_limit = limit;
        self.default_algorithm = algorithm.into();
        self
    }

    /// Similar artists for `external_id`, best first. Empty on any failure.
    pub async fn similar_artists(
        &self,
        external_id: &str,
        options: SimilarityOptions,
    ) -> Vec<SimilarArtistRef> {
        let external_id = external_id.trim().to_string();
        if external_id.is_empty() {
            return Vec::new();
        }

        let limit = options.limit.unwrap_or(self.default_limit);
        let algorithm = options
            .algorithm
            .unwrap_or_else(|| self.default_algorithm.clone());
        let service = Arc::clone(&self.service);
        let id = external_id.clone();

        let mut similar = paced(&self.queue, move || async move {
            service.similar_artists(&id, limit, &algorithm).await
        })
        .await
        .degrade("similar artists", &external_id);

        similar.truncate(limit);
        similar
    }
}
