//! # Explore Controller
//!
//! Owns the discovery run loop.
//!
//! ## Run
//!
//! 1. Preconditions: not already running, at least one seed, an active
//!    library connection. A failed precondition is a [`RunOutcome::Skipped`].
//! 2. Claim the session gate; the [`RunToken`] remembers the generation.
//! 3. Register the library's genre tags in the store.
//! 4. **Stage A**: walk the shuffled seeds, resolve each to an MBID, look up
//!    similar artists and commit new ones with their albums until the target
//!    size is reached.
//! 5. **Stage B**: fetch top albums for every genre not yet fetched.
//! 6. Mark the state bootstrapped after the first complete pass.
//!
//! The token is checked at the top of every loop iteration and after every
//! awaited external call. Once [`ExploreController::invalidate_session`] has
//! moved the generation on, the run returns [`RunOutcome::Cancelled`] without
//! committing anything further.
//!
//! ## Sizing
//!
//! Before the first complete pass the run aims for `bootstrap_target` similar
//! artists in total. Afterwards each run adds `top_up_increment` more.

use crate::error::{ExploreError, Result};
use crate::genre_rows::GenreRowSampler;
use crate::models::{ExternalArtistSummary, SeedArtist, SimilarArtistRef};
use crate::pipeline::{
    CatalogEnricher, GenreFeedFetcher, MbidResolver, SimilarityFetcher, SimilarityOptions,
};
use crate::providers::{LastFmClient, ListenBrainzClient, MusicBrainzClient};
use crate::queue::RateLimitedQueue;
use crate::services::{CatalogService, LibrarySelector, ResolutionService, SimilarityService};
use crate::session::{Cancelled, RunToken, SessionGate};
use crate::state::{ExploreMutation, ExploreStore};
use core_runtime::config::{DiscoveryTuning, ExploreConfig};
use core_runtime::events::{CoreEvent, EventBus, ExploreEvent, SessionEvent};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const METABRAINZ_QUEUE: &str = "metabrainz";
pub const CATALOG_QUEUE: &str = "catalog";

/// Why a run did not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    AlreadyRunning,
    NoSeeds,
    NoConnection,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::AlreadyRunning => "already_running",
            SkipReason::NoSeeds => "no_seeds",
            SkipReason::NoConnection => "no_connection",
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub generation: u64,
    /// Seeds taken from the list (Various Artists excluded)
    pub seeds_considered: usize,
    /// Seeds whose similarity lookup was committed
    pub seeds_expanded: usize,
    pub artists_added: usize,
    pub genres_fetched: usize,
    /// State of the bootstrapped flag when the run ended
    pub bootstrapped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Skipped(SkipReason),
    Completed(RunSummary),
    /// Superseded by a newer session; the summary covers work committed
    /// before the cancellation was noticed.
    Cancelled(RunSummary),
}

impl RunOutcome {
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            RunOutcome::Skipped(_) => None,
            RunOutcome::Completed(summary) | RunOutcome::Cancelled(summary) => Some(summary),
        }
    }
}

pub struct ExploreController {
    store: Arc<dyn ExploreStore>,
    selector: Arc<dyn LibrarySelector>,
    resolver: MbidResolver,
    similarity: SimilarityFetcher,
    enricher: CatalogEnricher,
    genre_feed: GenreFeedFetcher,
    gate: SessionGate,
    event_bus: Option<EventBus>,
    bootstrap_target: usize,
    top_up_increment: usize,
    genre_row_count: usize,
}

impl ExploreController {
    pub fn builder() -> ExploreControllerBuilder {
        ExploreControllerBuilder::default()
    }

    /// Wire the MusicBrainz, ListenBrainz and Last.fm clients from
    /// configuration. Must be called inside a Tokio runtime.
    pub fn from_config(
        config: &ExploreConfig,
        store: Arc<dyn ExploreStore>,
        selector: Arc<dyn LibrarySelector>,
        event_bus: Option<EventBus>,
    ) -> Result<Self> {
        config.validate()?;

        let http = Arc::clone(&config.http_client);
        let resolution = Arc::new(MusicBrainzClient::from_config(Arc::clone(&http), &config.api));
        let similarity = Arc::new(ListenBrainzClient::from_config(Arc::clone(&http), &config.api));
        let catalog = LastFmClient::from_config(http, &config.api);
        if !catalog.has_api_key() {
            warn!("No Last.fm API key configured; artist details and genre feeds will stay empty");
        }

        let mut builder = Self::builder()
            .store(store)
            .selector(selector)
            .resolution_service(resolution)
            .similarity_service(similarity)
            .catalog_service(Arc::new(catalog))
            .tuning(config.tuning.clone());
        if let Some(bus) = event_bus {
            builder = builder.event_bus(bus);
        }
        builder.build()
    }

    pub fn is_running(&self) -> bool {
        self.gate.is_running()
    }

    pub fn generation(&self) -> u64 {
        self.gate.generation()
    }

    /// Supersede the current run, if any, and release the running flag.
    ///
    /// The superseded run stops at its next checkpoint. Returns the new
    /// generation.
    pub fn invalidate_session(&self) -> u64 {
        let generation = self.gate.invalidate();
        info!(generation, "Explore session invalidated");
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Session(SessionEvent::Invalidated { generation }))
                .ok();
        }
        generation
    }

    /// Genre row sampler sharing this controller's catalog queue.
    pub fn genre_row_sampler(&self) -> GenreRowSampler {
        GenreRowSampler::new(self.genre_feed.clone())
    }

    /// Number of genre rows hosts should request from the sampler.
    pub fn genre_row_count(&self) -> usize {
        self.genre_row_count
    }

    /// Run one discovery pass over `seeds`.
    #[instrument(skip(self, seeds), fields(seeds = seeds.len()))]
    pub async fn run(&self, seeds: Vec<SeedArtist>) -> RunOutcome {
        if self.gate.is_running() {
            return self.skip(SkipReason::AlreadyRunning);
        }
        if seeds.is_empty() {
            return self.skip(SkipReason::NoSeeds);
        }
        if !self.selector.has_active_connection() {
            return self.skip(SkipReason::NoConnection);
        }
        let Some(token) = self.gate.try_begin() else {
            return self.skip(SkipReason::AlreadyRunning);
        };

        let was_bootstrapped = self.store.snapshot().bootstrapped;
        info!(
            generation = token.generation(),
            bootstrapped = was_bootstrapped,
            "Explore run started"
        );
        self.emit(ExploreEvent::RunStarted {
            generation: token.generation(),
            seed_count: seeds.len(),
            bootstrapped: was_bootstrapped,
        });

        let mut summary = RunSummary {
            generation: token.generation(),
            ..RunSummary::default()
        };

        match self.execute(&token, seeds, &mut summary).await {
            Ok(()) => {
                summary.bootstrapped = self.store.snapshot().bootstrapped;
                info!(
                    generation = summary.generation,
                    artists_added = summary.artists_added,
                    genres_fetched = summary.genres_fetched,
                    "Explore run completed"
                );
                self.emit(ExploreEvent::RunCompleted {
                    generation: summary.generation,
                    artists_added: summary.artists_added,
                    genres_fetched: summary.genres_fetched,
                    bootstrapped: summary.bootstrapped,
                });
                RunOutcome::Completed(summary)
            }
            Err(cancelled) => {
                summary.bootstrapped = self.store.snapshot().bootstrapped;
                info!(%cancelled, "Explore run cancelled");
                self.emit(ExploreEvent::RunCancelled {
                    generation: summary.generation,
                });
                RunOutcome::Cancelled(summary)
            }
        }
    }

    fn skip(&self, reason: SkipReason) -> RunOutcome {
        debug!(reason = reason.as_str(), "Explore run skipped");
        self.emit(ExploreEvent::RunSkipped {
            reason: reason.as_str().to_string(),
        });
        RunOutcome::Skipped(reason)
    }

    fn emit(&self, event: ExploreEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Explore(event)).ok();
        }
    }

    async fn execute(
        &self,
        token: &RunToken,
        seeds: Vec<SeedArtist>,
        summary: &mut RunSummary,
    ) -> std::result::Result<(), Cancelled> {
        token.checkpoint()?;
        let genres = self.selector.known_genres();
        if !genres.is_empty() {
            self.store.dispatch(ExploreMutation::SyncGenres { genres });
        }

        self.expand_similar_artists(token, seeds, summary).await?;
        self.expand_genre_feeds(token, summary).await?;

        token.checkpoint()?;
        if !self.store.snapshot().bootstrapped {
            info!("Initial discovery pass complete");
            self.store.dispatch(ExploreMutation::MarkBootstrapped);
        }
        Ok(())
    }

    fn desired_total(&self) -> usize {
        let state = self.store.snapshot();
        if state.bootstrapped {
            state.similar_artists.len() + self.top_up_increment
        } else {
            self.bootstrap_target
        }
    }

    fn similar_count(&self) -> usize {
        self.store.snapshot().similar_artists.len()
    }

    async fn expand_similar_artists(
        &self,
        token: &RunToken,
        mut seeds: Vec<SeedArtist>,
        summary: &mut RunSummary,
    ) -> std::result::Result<(), Cancelled> {
        let desired_total = self.desired_total();
        seeds.shuffle(&mut rand::thread_rng());
        debug!(desired_total, "Expanding similar artists");

        for seed in seeds {
            token.checkpoint()?;
            if self.similar_count() >= desired_total {
                break;
            }
            if seed.is_various_artists() {
                debug!(seed = %seed.display_name, "Skipping compilation seed");
                continue;
            }
            summary.seeds_considered += 1;

            let id_map = self.store.snapshot().external_ids;
            let resolution = self.resolver.resolve(&seed, &id_map).await;
            token.checkpoint()?;
            let Some(resolution) = resolution else {
                debug!(seed = %seed.display_name, "Seed could not be resolved");
                continue;
            };

            if resolution.is_from_search() {
                if let Some(local_id) = &seed.local_id {
                    self.store.dispatch(ExploreMutation::CacheExternalId {
                        local_id: local_id.clone(),
                        external_id: resolution.external_id.clone(),
                    });
                }
            }

            let seed_id = resolution.external_id;
            if self.store.snapshot().is_seed_expanded(&seed_id) {
                debug!(seed = %seed.display_name, mbid = %seed_id, "Seed already expanded");
                continue;
            }

            let similar = self
                .similarity
                .similar_artists(&seed_id, SimilarityOptions::default())
                .await;
            token.checkpoint()?;

            for candidate in &similar {
                token.checkpoint()?;
                if self.add_similar_artist(token, &seed_id, candidate, desired_total, summary).await? {
                    break;
                }
            }

            self.store.dispatch(ExploreMutation::MarkSeedExpanded {
                external_id: seed_id.clone(),
            });
            summary.seeds_expanded += 1;
            self.emit(ExploreEvent::SeedExpanded {
                seed_id,
                similar_count: similar.len(),
            });
        }

        Ok(())
    }

    /// Commit one similarity candidate. Returns `true` once the target size
    /// is reached.
    async fn add_similar_artist(
        &self,
        token: &RunToken,
        seed_id: &str,
        candidate: &SimilarArtistRef,
        desired_total: usize,
        summary: &mut RunSummary,
    ) -> std::result::Result<bool, Cancelled> {
        let state = self.store.snapshot();
        if state.similar_artists.len() >= desired_total {
            return Ok(true);
        }
        if candidate.external_id == seed_id || state.has_similar_artist(&candidate.external_id) {
            return Ok(false);
        }
        drop(state);

        let looked_up = self.enricher.artist(&candidate.external_id).await;
        token.checkpoint()?;

        let artist = match looked_up {
            Some(artist) => ExternalArtistSummary {
                id: candidate.external_id.clone(),
                ..artist
            },
            None => match &candidate.name {
                Some(name) => ExternalArtistSummary {
                    id: candidate.external_id.clone(),
                    name: name.clone(),
                    cover_url: None,
                    bio: None,
                },
                None => {
                    debug!(mbid = %candidate.external_id, "No catalog entry or name for similar artist");
                    return Ok(false);
                }
            },
        };

        self.store.dispatch(ExploreMutation::AddSimilarArtist {
            artist: artist.clone(),
        });
        summary.artists_added += 1;
        debug!(artist = %artist.name, mbid = %artist.id, "Similar artist added");
        self.emit(ExploreEvent::ArtistAdded {
            artist_id: artist.id.clone(),
            name: artist.name.clone(),
            seed_id: seed_id.to_string(),
        });

        let albums = self.enricher.albums(&artist).await;
        token.checkpoint()?;
        if !albums.is_empty() {
            let count = albums.len();
            self.store.dispatch(ExploreMutation::AppendArtistAlbums {
                artist_id: artist.id.clone(),
                albums,
                cap: self.enricher.albums_per_artist(),
            });
            self.emit(ExploreEvent::AlbumsAppended {
                artist_id: artist.id,
                count,
            });
        }

        Ok(self.similar_count() >= desired_total)
    }

    async fn expand_genre_feeds(
        &self,
        token: &RunToken,
        summary: &mut RunSummary,
    ) -> std::result::Result<(), Cancelled> {
        let pending = self.store.snapshot().pending_genres();
        debug!(pending = pending.len(), "Expanding genre feeds");

        for genre in pending {
            token.checkpoint()?;
            let already_fetched = self
                .store
                .snapshot()
                .genre_feed(&genre)
                .map(|feed| feed.fetched)
                .unwrap_or(false);
            if already_fetched {
                continue;
            }

            let albums = self.genre_feed.top_albums(&genre).await;
            token.checkpoint()?;

            let album_count = albums.len();
            self.store.dispatch(ExploreMutation::CommitGenreFeed {
                genre: genre.clone(),
                albums,
            });
            summary.genres_fetched += 1;
            self.emit(ExploreEvent::GenreFeedFetched { genre, album_count });
        }

        Ok(())
    }
}

/// Builder for [`ExploreController`].
///
/// Store, selector and the three services are required. Queues default to
/// one MetaBrainz queue shared by resolution and similarity and one catalog
/// queue, paced per [`DiscoveryTuning`].
#[derive(Default)]
pub struct ExploreControllerBuilder {
    store: Option<Arc<dyn ExploreStore>>,
    selector: Option<Arc<dyn LibrarySelector>>,
    resolution: Option<Arc<dyn ResolutionService>>,
    similarity: Option<Arc<dyn SimilarityService>>,
    catalog: Option<Arc<dyn CatalogService>>,
    metabrainz_queue: Option<RateLimitedQueue>,
    catalog_queue: Option<RateLimitedQueue>,
    tuning: DiscoveryTuning,
    event_bus: Option<EventBus>,
}

impl ExploreControllerBuilder {
    pub fn store(mut self, store: Arc<dyn ExploreStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn selector(mut self, selector: Arc<dyn LibrarySelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn resolution_service(mut self, service: Arc<dyn ResolutionService>) -> Self {
        self.resolution = Some(service);
        self
    }

    pub fn similarity_service(mut self, service: Arc<dyn SimilarityService>) -> Self {
        self.similarity = Some(service);
        self
    }

    pub fn catalog_service(mut self, service: Arc<dyn CatalogService>) -> Self {
        self.catalog = Some(service);
        self
    }

    /// Queue for MusicBrainz and ListenBrainz calls.
    pub fn metabrainz_queue(mut self, queue: RateLimitedQueue) -> Self {
        self.metabrainz_queue = Some(queue);
        self
    }

    /// Queue for Last.fm calls.
    pub fn catalog_queue(mut self, queue: RateLimitedQueue) -> Self {
        self.catalog_queue = Some(queue);
        self
    }

    pub fn tuning(mut self, tuning: DiscoveryTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    fn required<T>(value: Option<T>, what: &str) -> Result<T> {
        value.ok_or_else(|| {
            ExploreError::Config(format!("{} is required to build an ExploreController", what))
        })
    }

    pub fn build(self) -> Result<ExploreController> {
        self.tuning.validate()?;

        let store = Self::required(self.store, "ExploreStore")?;
        let selector = Self::required(self.selector, "LibrarySelector")?;
        let resolution = Self::required(self.resolution, "ResolutionService")?;
        let similarity = Self::required(self.similarity, "SimilarityService")?;
        let catalog = Self::required(self.catalog, "CatalogService")?;

        let tuning = self.tuning;
        let metabrainz_queue = match self.metabrainz_queue {
            Some(queue) => queue,
            None => RateLimitedQueue::new(METABRAINZ_QUEUE, tuning.metabrainz_spacing())?,
        };
        let catalog_queue = match self.catalog_queue {
            Some(queue) => queue,
            None => RateLimitedQueue::new(CATALOG_QUEUE, tuning.catalog_spacing())?,
        };

        Ok(ExploreController {
            store,
            selector,
            resolver: MbidResolver::new(
                resolution,
                metabrainz_queue.clone(),
                tuning.search_candidate_limit,
            ),
            similarity: SimilarityFetcher::new(similarity, metabrainz_queue)
                .with_defaults(tuning.similar_limit, tuning.similarity_algorithm.clone()),
            enricher: CatalogEnricher::new(
                Arc::clone(&catalog),
                catalog_queue.clone(),
                tuning.albums_per_artist,
            ),
            genre_feed: GenreFeedFetcher::new(catalog, catalog_queue, tuning.genre_album_limit),
            gate: SessionGate::new(),
            event_bus: self.event_bus,
            bootstrap_target: tuning.bootstrap_target,
            top_up_increment: tuning.top_up_increment,
            genre_row_count: tuning.genre_row_count,
        })
    }
}
