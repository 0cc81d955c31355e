//! Value types flowing through the discovery pipeline.

use serde::{Deserialize, Serialize};

/// A library artist used as a starting point for similarity lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedArtist {
    /// Artist id on the library server, if the seed came from the library
    pub local_id: Option<String>,
    pub display_name: String,
    /// MusicBrainz id, when the library already knows it
    pub external_id: Option<String>,
}

impl SeedArtist {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            local_id: None,
            display_name: display_name.into(),
            external_id: None,
        }
    }

    pub fn with_local_id(mut self, local_id: impl Into<String>) -> Self {
        self.local_id = Some(local_id.into());
        self
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// Compilation placeholders that would drag in unrelated artists.
    pub fn is_various_artists(&self) -> bool {
        self.display_name.trim().eq_ignore_ascii_case("various artists")
    }
}

/// Display metadata for an artist on the external catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalArtistSummary {
    /// MusicBrainz id
    pub id: String,
    pub name: String,
    pub cover_url: Option<String>,
    pub bio: Option<String>,
}

/// An album as reported by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalAlbumSummary {
    /// Album MBID, else the catalog URL, else `"{artist}::{name}"`
    pub id: String,
    pub name: String,
    pub artist_name: String,
    pub artist_id: Option<String>,
    pub cover_url: Option<String>,
}

/// One row of a similarity response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarArtistRef {
    pub external_id: String,
    pub name: Option<String>,
    pub score: f64,
}

/// One hit of an artist name search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistCandidate {
    pub id: String,
    pub name: String,
    pub score: i32,
}

/// A discovered artist and the albums collected for it so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarArtistEntry {
    pub artist: ExternalArtistSummary,
    pub albums: Vec<ExternalAlbumSummary>,
}

/// Top albums for one genre tag. `fetched` is terminal until a reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreFeedEntry {
    pub genre: String,
    pub albums: Vec<ExternalAlbumSummary>,
    pub fetched: bool,
}

impl GenreFeedEntry {
    pub fn pending(genre: impl Into<String>) -> Self {
        Self {
            genre: genre.into(),
            albums: Vec::new(),
            fetched: false,
        }
    }
}

/// One genre row for the explore screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreRow {
    pub genre: String,
    pub albums: Vec<ExternalAlbumSummary>,
}
