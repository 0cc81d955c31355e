//! Collaborator traits consumed by the discovery pipeline.
//!
//! The concrete clients in [`crate::providers`] implement the three service
//! traits over the `HttpClient` bridge. The library selector is supplied by
//! the host; it knows whether a library server session is live and which
//! genre tags the library contains.

use crate::error::Result;
use crate::models::{ArtistCandidate, ExternalAlbumSummary, ExternalArtistSummary, SimilarArtistRef};
use async_trait::async_trait;

/// Artist name search (MusicBrainz).
#[async_trait]
pub trait ResolutionService: Send + Sync {
    /// Candidates ordered best-first.
    async fn search_artists(&self, name: &str, limit: usize) -> Result<Vec<ArtistCandidate>>;
}

/// Similar-artist lookup (ListenBrainz labs).
#[async_trait]
pub trait SimilarityService: Send + Sync {
    /// Similar artists ordered by descending score, excluding `external_id`.
    async fn similar_artists(
        &self,
        external_id: &str,
        limit: usize,
        algorithm: &str,
    ) -> Result<Vec<SimilarArtistRef>>;
}

/// Artist and album catalog (Last.fm).
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// `Ok(None)` when the catalog does not know the artist.
    async fn artist(&self, external_id: &str) -> Result<Option<ExternalArtistSummary>>;

    /// Top albums of an artist. `name` is used when the id is unknown to the
    /// catalog.
    async fn artist_albums(
        &self,
        external_id: &str,
        name: &str,
        limit: usize,
    ) -> Result<Vec<ExternalAlbumSummary>>;

    async fn top_albums_for_genre(
        &self,
        genre: &str,
        limit: usize,
    ) -> Result<Vec<ExternalAlbumSummary>>;
}

/// Host view of the user's library.
pub trait LibrarySelector: Send + Sync {
    /// Whether an authenticated library server connection is active.
    fn has_active_connection(&self) -> bool;

    /// Genre tags present in the library, in display order.
    fn known_genres(&self) -> Vec<String>;
}
