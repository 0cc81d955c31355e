//! # Explore State
//!
//! The discovery progress shared between the controller and the UI.
//!
//! State only changes through [`ExploreMutation`]s applied by
//! [`ExploreState::apply`]. The reducer enforces the collection invariants
//! itself (no duplicate artists, write-once id cache, terminal genre feeds),
//! so a store never has to trust the order in which mutations arrive.
//!
//! [`ExploreStore`] is the seam the controller writes through;
//! [`InMemoryExploreStore`] backs it with a `tokio::sync::watch` channel so
//! views can await changes.

use crate::models::{ExternalAlbumSummary, ExternalArtistSummary, GenreFeedEntry, SimilarArtistEntry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreState {
    /// External ids already used as similarity seeds
    pub expanded_seeds: BTreeSet<String>,
    /// Library artist id → resolved MusicBrainz id
    pub external_ids: BTreeMap<String, String>,
    pub similar_artists: Vec<SimilarArtistEntry>,
    pub genre_feeds: Vec<GenreFeedEntry>,
    /// Set once a full discovery pass completed
    pub bootstrapped: bool,
}

impl ExploreState {
    pub fn is_seed_expanded(&self, external_id: &str) -> bool {
        self.expanded_seeds.contains(external_id)
    }

    pub fn cached_external_id(&self, local_id: &str) -> Option<&str> {
        self.external_ids.get(local_id).map(String::as_str)
    }

    pub fn has_similar_artist(&self, external_id: &str) -> bool {
        self.similar_artists
            .iter()
            .any(|entry| entry.artist.id == external_id)
    }

    pub fn similar_artist(&self, external_id: &str) -> Option<&SimilarArtistEntry> {
        self.similar_artists
            .iter()
            .find(|entry| entry.artist.id == external_id)
    }

    /// Genre tags match case-insensitively.
    pub fn genre_feed(&self, genre: &str) -> Option<&GenreFeedEntry> {
        let key = genre.to_lowercase();
        self.genre_feeds
            .iter()
            .find(|entry| entry.genre.to_lowercase() == key)
    }

    /// Genres still waiting for their first fetch, in stored order.
    pub fn pending_genres(&self) -> Vec<String> {
        self.genre_feeds
            .iter()
            .filter(|entry| !entry.fetched)
            .map(|entry| entry.genre.clone())
            .collect()
    }

    /// Apply a mutation. Returns whether anything changed.
    pub fn apply(&mut self, mutation: ExploreMutation) -> bool {
        match mutation {
            ExploreMutation::CacheExternalId {
                local_id,
                external_id,
            } => {
                if self.external_ids.contains_key(&local_id) {
                    return false;
                }
                self.external_ids.insert(local_id, external_id);
                true
            }
            ExploreMutation::MarkSeedExpanded { external_id } => {
                self.expanded_seeds.insert(external_id)
            }
            ExploreMutation::AddSimilarArtist { artist } => {
                if self.has_similar_artist(&artist.id) {
                    return false;
                }
                self.similar_artists.push(SimilarArtistEntry {
                    artist,
                    albums: Vec::new(),
                });
                true
            }
            ExploreMutation::AppendArtistAlbums {
                artist_id,
                albums,
                cap,
            } => {
                let Some(entry) = self
                    .similar_artists
                    .iter_mut()
                    .find(|entry| entry.artist.id == artist_id)
                else {
                    return false;
                };

                let mut seen: HashSet<String> =
                    entry.albums.iter().map(|album| album.id.clone()).collect();
                let before = entry.albums.len();
                let room = cap.saturating_sub(before);
                entry.albums.extend(
                    albums
                        .into_iter()
                        .filter(|album| seen.insert(album.id.clone()))
                        .take(room),
                );
                entry.albums.len() != before
            }
            ExploreMutation::SyncGenres { genres } => {
                let mut changed = false;
                for genre in genres {
                    let genre = genre.trim();
                    if genre.is_empty() || self.genre_feed(genre).is_some() {
                        continue;
                    }
                    self.genre_feeds.push(GenreFeedEntry::pending(genre));
                    changed = true;
                }
                changed
            }
            ExploreMutation::CommitGenreFeed { genre, albums } => {
                let key = genre.to_lowercase();
                match self
                    .genre_feeds
                    .iter_mut()
                    .find(|entry| entry.genre.to_lowercase() == key)
                {
                    Some(entry) if entry.fetched => false,
                    Some(entry) => {
                        entry.albums = albums;
                        entry.fetched = true;
                        true
                    }
                    None => {
                        self.genre_feeds.push(GenreFeedEntry {
                            genre,
                            albums,
                            fetched: true,
                        });
                        true
                    }
                }
            }
            ExploreMutation::MarkBootstrapped => {
                let changed = !self.bootstrapped;
                self.bootstrapped = true;
                changed
            }
            ExploreMutation::Reset => {
                let changed = *self != ExploreState::default();
                *self = ExploreState::default();
                changed
            }
        }
    }
}

/// Every change the controller can make to [`ExploreState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExploreMutation {
    /// Remember a search-based resolution. Write-once per local id.
    CacheExternalId {
        local_id: String,
        external_id: String,
    },
    MarkSeedExpanded {
        external_id: String,
    },
    /// Add an artist with no albums. Ignored if the id is already present.
    AddSimilarArtist {
        artist: ExternalArtistSummary,
    },
    /// Append albums not already on the artist, up to `cap` albums in total.
    AppendArtistAlbums {
        artist_id: String,
        albums: Vec<ExternalAlbumSummary>,
        cap: usize,
    },
    /// Register genre tags from the library. Existing records are untouched.
    SyncGenres {
        genres: Vec<String>,
    },
    /// Store a genre's albums and mark it fetched. Ignored once fetched.
    CommitGenreFeed {
        genre: String,
        albums: Vec<ExternalAlbumSummary>,
    },
    MarkBootstrapped,
    /// External reset: forget all discovery progress.
    Reset,
}

/// Shared state store the controller reads from and commits into.
///
/// `dispatch` must apply the mutation before returning so that the next
/// `snapshot` observes it.
pub trait ExploreStore: Send + Sync {
    fn snapshot(&self) -> ExploreState;

    fn dispatch(&self, mutation: ExploreMutation);
}

/// Store backed by a `watch` channel.
#[derive(Debug)]
pub struct InMemoryExploreStore {
    state: watch::Sender<ExploreState>,
}

impl InMemoryExploreStore {
    pub fn new() -> Self {
        Self::with_state(ExploreState::default())
    }

    /// Start from previously persisted progress.
    pub fn with_state(state: ExploreState) -> Self {
        let (state, _) = watch::channel(state);
        Self { state }
    }

    /// Receiver notified after every mutation that changed the state.
    pub fn subscribe(&self) -> watch::Receiver<ExploreState> {
        self.state.subscribe()
    }
}

impl Default for InMemoryExploreStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ExploreStore for InMemoryExploreStore {
    fn snapshot(&self) -> ExploreState {
        self.state.borrow().clone()
    }

    fn dispatch(&self, mutation: ExploreMutation) {
        self.state.send_if_modified(|state| state.apply(mutation));
    }
}
