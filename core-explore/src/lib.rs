//! # Explore Discovery Module
//!
//! Builds the "similar artists" and "genre" feeds of the explore screen by
//! chaining three rate-limited external services.
//!
//! ## Overview
//!
//! A discovery run takes a batch of seed artists from the user's library and:
//! - Resolves each seed to a MusicBrainz id (MusicBrainz search)
//! - Looks up similar artists for the seed (ListenBrainz labs)
//! - Enriches every new artist with display metadata and albums (Last.fm)
//! - Fetches top albums for every library genre not yet fetched (Last.fm)
//! - Commits results incrementally into a shared [`ExploreStore`]
//!
//! Runs are single-flight, cancellable through [`ExploreController::invalidate_session`]
//! and resumable: expanded seeds and fetched genres are never requested again.
//!
//! ## Components
//!
//! - **Rate-limited queue** (`queue`): FIFO actor enforcing spacing between request starts
//! - **Session gate** (`session`): running flag and generation tokens
//! - **State** (`state`): discovery progress and its reducer
//! - **Pipeline** (`pipeline`): resolver, similarity, enricher and genre feed stages
//! - **Providers** (`providers`): MusicBrainz, ListenBrainz and Last.fm clients
//! - **Controller** (`controller`): the run loop
//! - **Genre rows** (`genre_rows`): random genre rows sampled on demand

pub mod controller;
pub mod error;
pub mod genre_rows;
pub mod mbid;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod queue;
pub mod services;
pub mod session;
pub mod state;

pub use controller::{
    ExploreController, ExploreControllerBuilder, RunOutcome, RunSummary, SkipReason,
};
pub use error::{ExploreError, Result};
pub use genre_rows::GenreRowSampler;
pub use mbid::is_mbid;
pub use models::{
    ArtistCandidate, ExternalAlbumSummary, ExternalArtistSummary, GenreFeedEntry, GenreRow,
    SeedArtist, SimilarArtistEntry, SimilarArtistRef,
};
pub use providers::{LastFmClient, ListenBrainzClient, MusicBrainzClient};
pub use queue::RateLimitedQueue;
pub use services::{CatalogService, LibrarySelector, ResolutionService, SimilarityService};
pub use session::{Cancelled, RunToken, SessionGate};
pub use state::{ExploreMutation, ExploreState, ExploreStore, InMemoryExploreStore};
