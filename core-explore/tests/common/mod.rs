//! Hand-written fakes shared by the controller integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use core_explore::{
    ArtistCandidate, CatalogService, ExploreController, ExploreError, ExploreMutation,
    ExploreState, ExploreStore, ExternalAlbumSummary, ExternalArtistSummary,
    InMemoryExploreStore, LibrarySelector, ResolutionService, Result, SimilarArtistRef,
    SimilarityService,
};
use core_runtime::config::DiscoveryTuning;
use core_runtime::events::EventBus;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::time::Instant;

/// Deterministic MBID-shaped id.
pub fn mbid(n: u32) -> String {
    format!("{:08x}-0000-4000-8000-000000000000", n)
}

pub fn similar_ref(n: u32) -> SimilarArtistRef {
    SimilarArtistRef {
        external_id: mbid(n),
        name: Some(format!("Artist {}", n)),
        score: 1000.0 - n as f64,
    }
}

pub fn artist_summary(id: &str, name: &str) -> ExternalArtistSummary {
    ExternalArtistSummary {
        id: id.to_string(),
        name: name.to_string(),
        cover_url: None,
        bio: None,
    }
}

/// Start time of every service call, shared across fakes.
#[derive(Default)]
pub struct CallLog {
    calls: Mutex<Vec<(&'static str, String, Instant)>>,
}

impl CallLog {
    fn record(&self, service: &'static str, subject: &str) {
        self.calls
            .lock()
            .unwrap()
            .push((service, subject.to_string(), Instant::now()));
    }

    pub fn subjects(&self, service: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _, _)| *s == service)
            .map(|(_, subject, _)| subject.clone())
            .collect()
    }

    pub fn count(&self, service: &str) -> usize {
        self.subjects(service).len()
    }

    /// Start instants of the calls made to any of `services`, in order.
    pub fn starts(&self, services: &[&str]) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _, _)| services.contains(s))
            .map(|(_, _, at)| *at)
            .collect()
    }
}

/// Name search answering from a fixed table.
pub struct FakeResolution {
    log: Arc<CallLog>,
    results: HashMap<String, Vec<ArtistCandidate>>,
}

impl FakeResolution {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self {
            log,
            results: HashMap::new(),
        }
    }

    pub fn with_artist(mut self, name: &str, id: &str) -> Self {
        self.results.insert(
            name.to_string(),
            vec![ArtistCandidate {
                id: id.to_string(),
                name: name.to_string(),
                score: 100,
            }],
        );
        self
    }
}

#[async_trait]
impl ResolutionService for FakeResolution {
    async fn search_artists(&self, name: &str, _limit: usize) -> Result<Vec<ArtistCandidate>> {
        self.log.record("search", name);
        Ok(self.results.get(name).cloned().unwrap_or_default())
    }
}

/// Gate that lets a test hold a service call open.
#[derive(Default)]
pub struct CallLatch {
    pub entered: Notify,
    pub release: Notify,
}

/// Similarity lookup answering from a fixed table.
pub struct FakeSimilarity {
    log: Arc<CallLog>,
    results: HashMap<String, Vec<SimilarArtistRef>>,
    failing: Vec<String>,
    latch: Option<Arc<CallLatch>>,
}

impl FakeSimilarity {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self {
            log,
            results: HashMap::new(),
            failing: Vec::new(),
            latch: None,
        }
    }

    pub fn with_similar(mut self, seed: &str, similar: Vec<SimilarArtistRef>) -> Self {
        self.results.insert(seed.to_string(), similar);
        self
    }

    pub fn failing_for(mut self, seed: &str) -> Self {
        self.failing.push(seed.to_string());
        self
    }

    /// Every call waits for `latch.release` after signalling `latch.entered`.
    pub fn with_latch(mut self, latch: Arc<CallLatch>) -> Self {
        self.latch = Some(latch);
        self
    }
}

#[async_trait]
impl SimilarityService for FakeSimilarity {
    async fn similar_artists(
        &self,
        external_id: &str,
        limit: usize,
        _algorithm: &str,
    ) -> Result<Vec<SimilarArtistRef>> {
        self.log.record("similar", external_id);
        if let Some(latch) = &self.latch {
            latch.entered.notify_one();
            latch.release.notified().await;
        }
        if self.failing.iter().any(|seed| seed == external_id) {
            return Err(ExploreError::Http {
                status: 503,
                body: "Service Unavailable".to_string(),
            });
        }
        let mut similar = self.results.get(external_id).cloned().unwrap_or_default();
        similar.truncate(limit);
        Ok(similar)
    }
}

/// Catalog returning three albums per artist and two per genre.
pub struct FakeCatalog {
    log: Arc<CallLog>,
    unknown_artists: Vec<String>,
}

impl FakeCatalog {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self {
            log,
            unknown_artists: Vec::new(),
        }
    }

    pub fn without_artist(mut self, id: &str) -> Self {
        self.unknown_artists.push(id.to_string());
        self
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn artist(&self, external_id: &str) -> Result<Option<ExternalArtistSummary>> {
        self.log.record("artist", external_id);
        if self.unknown_artists.iter().any(|id| id == external_id) {
            return Ok(None);
        }
        Ok(Some(artist_summary(
            external_id,
            &format!("Catalog {}", external_id),
        )))
    }

    async fn artist_albums(
        &self,
        external_id: &str,
        name: &str,
        limit: usize,
    ) -> Result<Vec<ExternalAlbumSummary>> {
        self.log.record("albums", external_id);
        Ok((0..3)
            .map(|i| ExternalAlbumSummary {
                id: format!("{}-album-{}", external_id, i),
                name: format!("Album {}", i),
                artist_name: name.to_string(),
                artist_id: Some(external_id.to_string()),
                cover_url: None,
            })
            .take(limit)
            .collect())
    }

    async fn top_albums_for_genre(
        &self,
        genre: &str,
        limit: usize,
    ) -> Result<Vec<ExternalAlbumSummary>> {
        self.log.record("genre", genre);
        Ok((0..2)
            .map(|i| ExternalAlbumSummary {
                id: format!("{}-top-{}", genre, i),
                name: format!("{} classic {}", genre, i),
                artist_name: "Someone".to_string(),
                artist_id: None,
                cover_url: None,
            })
            .take(limit)
            .collect())
    }
}

pub struct FakeSelector {
    connected: bool,
    genres: Vec<String>,
}

impl FakeSelector {
    pub fn connected(genres: &[&str]) -> Self {
        Self {
            connected: true,
            genres: genres.iter().map(|g| g.to_string()).collect(),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            genres: Vec::new(),
        }
    }
}

impl LibrarySelector for FakeSelector {
    fn has_active_connection(&self) -> bool {
        self.connected
    }

    fn known_genres(&self) -> Vec<String> {
        self.genres.clone()
    }
}

/// In-memory store that also records every dispatched mutation.
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryExploreStore,
    mutations: Mutex<Vec<ExploreMutation>>,
}

impl RecordingStore {
    pub fn with_state(state: ExploreState) -> Self {
        Self {
            inner: InMemoryExploreStore::with_state(state),
            mutations: Mutex::new(Vec::new()),
        }
    }

    pub fn mutations(&self) -> Vec<ExploreMutation> {
        self.mutations.lock().unwrap().clone()
    }
}

impl ExploreStore for RecordingStore {
    fn snapshot(&self) -> ExploreState {
        self.inner.snapshot()
    }

    fn dispatch(&self, mutation: ExploreMutation) {
        self.mutations.lock().unwrap().push(mutation.clone());
        self.inner.dispatch(mutation);
    }
}

/// Store whose commits blow up, for exercising unwinding out of a run.
#[derive(Default)]
pub struct PanickingStore;

impl ExploreStore for PanickingStore {
    fn snapshot(&self) -> ExploreState {
        ExploreState::default()
    }

    fn dispatch(&self, mutation: ExploreMutation) {
        panic!("commit failed: {:?}", mutation);
    }
}

/// Everything a controller test needs to inspect.
pub struct Harness {
    pub controller: Arc<ExploreController>,
    pub store: Arc<RecordingStore>,
    pub log: Arc<CallLog>,
    pub bus: EventBus,
}

pub struct HarnessBuilder {
    pub log: Arc<CallLog>,
    pub resolution: Option<FakeResolution>,
    pub similarity: Option<FakeSimilarity>,
    pub catalog: Option<FakeCatalog>,
    pub selector: FakeSelector,
    pub state: ExploreState,
    pub tuning: DiscoveryTuning,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        let log = Arc::new(CallLog::default());
        Self {
            log,
            resolution: None,
            similarity: None,
            catalog: None,
            selector: FakeSelector::connected(&[]),
            state: ExploreState::default(),
            tuning: DiscoveryTuning::default(),
        }
    }

    pub fn resolution(mut self, f: impl FnOnce(FakeResolution) -> FakeResolution) -> Self {
        self.resolution = Some(f(FakeResolution::new(Arc::clone(&self.log))));
        self
    }

    pub fn similarity(mut self, f: impl FnOnce(FakeSimilarity) -> FakeSimilarity) -> Self {
        self.similarity = Some(f(FakeSimilarity::new(Arc::clone(&self.log))));
        self
    }

    pub fn catalog(mut self, f: impl FnOnce(FakeCatalog) -> FakeCatalog) -> Self {
        self.catalog = Some(f(FakeCatalog::new(Arc::clone(&self.log))));
        self
    }

    pub fn selector(mut self, selector: FakeSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn state(mut self, state: ExploreState) -> Self {
        self.state = state;
        self
    }

    pub fn tuning(mut self, tuning: DiscoveryTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Must be called inside a Tokio runtime; the queues spawn workers.
    pub fn build(self) -> Harness {
        let log = self.log;
        let store = Arc::new(RecordingStore::with_state(self.state));
        let bus = EventBus::new(256);

        let resolution = self
            .resolution
            .unwrap_or_else(|| FakeResolution::new(Arc::clone(&log)));
        let similarity = self
            .similarity
            .unwrap_or_else(|| FakeSimilarity::new(Arc::clone(&log)));
        let catalog = self
            .catalog
            .unwrap_or_else(|| FakeCatalog::new(Arc::clone(&log)));

        let controller = ExploreController::builder()
            .store(Arc::clone(&store) as Arc<dyn ExploreStore>)
            .selector(Arc::new(self.selector))
            .resolution_service(Arc::new(resolution))
            .similarity_service(Arc::new(similarity))
            .catalog_service(Arc::new(catalog))
            .tuning(self.tuning)
            .event_bus(bus.clone())
            .build()
            .expect("controller builds");

        Harness {
            controller: Arc::new(controller),
            store,
            log,
            bus,
        }
    }
}

/// State already holding `count` similar artists with ids starting at `first`.
pub fn state_with_artists(first: u32, count: u32, bootstrapped: bool) -> ExploreState {
    let mut state = ExploreState::default();
    for n in first..first + count {
        state.apply(ExploreMutation::AddSimilarArtist {
            artist: artist_summary(&mbid(n), &format!("Existing {}", n)),
        });
    }
    if bootstrapped {
        state.apply(ExploreMutation::MarkBootstrapped);
    }
    state
}
