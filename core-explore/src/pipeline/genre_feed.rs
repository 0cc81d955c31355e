//! Top albums for a genre tag.

use super::{paced, Degrade};
use crate::models::ExternalAlbumSummary;
use crate::queue::RateLimitedQueue;
use crate::services::CatalogService;
use std::sync::Arc;

#[derive(Clone)]
pub struct GenreFeedFetcher {
    service: Arc<dyn CatalogService>,
    queue: RateLimitedQueue,
    album_limit: usize,
}

impl GenreFeedFetcher {
    pub fn new(service: Arc<dyn CatalogService>, queue: RateLimitedQueue, album_limit: usize) -> Self {
        Self {
            service,
            queue,
            album_limit,
        }
    }

    /// Up to the configured number of albums; empty on failure.
    pub async fn top_albums(&self, genre: &str) -> Vec<ExternalAlbumSummary> {
        let genre = genre.trim();
        if genre.is_empty() || self.album_limit == 0 {
            return Vec::new();
        }

        let service = Arc::clone(&self.service);
        let tag = genre.to_string();
        let limit = self.album_limit;

        let mut albums = paced(&self.queue, move || async move {
            service.top_albums_for_genre(&tag, limit).await
        })
        .await
        .degrade("genre albums", genre);

        albums.truncate(limit);
        albums
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExploreError, Result};
    use crate::models::ExternalArtistSummary;
    use async_trait::async_trait;
    use mockall::mock;
    use std::time::Duration;

    mock! {
        Catalog {}

        #[async_trait]
        impl CatalogService for Catalog {
            async fn artist(&self, external_id: &str) -> Result<Option<ExternalArtistSummary>>;
            async fn artist_albums(&self, external_id: &str, name: &str, limit: usize) -> Result<Vec<ExternalAlbumSummary>>;
            async fn top_albums_for_genre(&self, genre: &str, limit: usize) -> Result<Vec<ExternalAlbumSummary>>;
        }
    }

    fn fetcher(mock: MockCatalog) -> GenreFeedFetcher {
        let queue = RateLimitedQueue::new("catalog", Duration::from_millis(10)).unwrap();
        GenreFeedFetcher::new(Arc::new(mock), queue, 12)
    }

    fn album(id: &str) -> ExternalAlbumSummary {
        ExternalAlbumSummary {
            id: id.to_string(),
            name: id.to_string(),
            artist_name: "Miles Davis".to_string(),
            artist_id: None,
            cover_url: None,
        }
    }

    #[tokio::test]
    async fn test_fetches_trimmed_genre() {
        let mut mock = MockCatalog::new();
        mock.expect_top_albums_for_genre()
            .withf(|genre: &str, limit: &usize| genre == "jazz" && *limit == 12)
            .times(1)
            .returning(|_, _| Ok(vec![album("kind-of-blue")]));

        let albums = fetcher(mock).top_albums(" jazz ").await;
        assert_eq!(albums, vec![album("kind-of-blue")]);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_empty() {
        let mut mock = MockCatalog::new();
        mock.expect_top_albums_for_genre()
            .times(1)
            .returning(|_, _| Err(ExploreError::Http {
                status: 500,
                body: "Internal Server Error".to_string(),
            }));

        assert!(fetcher(mock).top_albums("rock").await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_genre_makes_no_call() {
        let mut mock = MockCatalog::new();
        mock.expect_top_albums_for_genre().times(0);

        assert!(fetcher(mock).top_albums("").await.is_empty());
    }
}
