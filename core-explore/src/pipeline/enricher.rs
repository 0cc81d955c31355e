//! Catalog metadata for discovered artists.

use super::{paced, Degrade};
use crate::models::{ExternalAlbumSummary, ExternalArtistSummary};
use crate::queue::RateLimitedQueue;
use crate::services::CatalogService;
use std::sync::Arc;

pub struct CatalogEnricher {
    service: Arc<dyn CatalogService>,
    queue: RateLimitedQueue,
    albums_per_artist: usize,
}

impl CatalogEnricher {
    pub fn new(
        service: Arc<dyn CatalogService>,
        queue: RateLimitedQueue,
        albums_per_artist: usize,
    ) -> Self {
        Self {
            service,
            queue,
            albums_per_artist,
        }
    }

    pub fn albums_per_artist(&self) -> usize {
        self.albums_per_artist
    }

    /// Display metadata; `None` if the catalog does not know the artist or
    /// the lookup failed.
    pub async fn artist(&self, external_id: &str) -> Option<ExternalArtistSummary> {
        let service = Arc::clone(&self.service);
        let id = external_id.to_string();

        paced(&self.queue, move || async move { service.artist(&id).await })
            .await
            .degrade("artist info", external_id)
    }

    /// At most `albums_per_artist` albums of `artist`.
    pub async fn albums(&self, artist: &ExternalArtistSummary) -> Vec<ExternalAlbumSummary> {
        if self.albums_per_artist == 0 {
            return Vec::new();
        }

        let service = Arc::clone(&self.service);
        let id = artist.id.clone();
        let name = artist.name.clone();
        let limit = self.albums_per_artist;

        let mut albums = paced(&self.queue, move || async move {
            service.artist_albums(&id, &name, limit).await
        })
        .await
        .degrade("artist albums", &artist.id);

        albums.truncate(limit);
        albums
    }
}
