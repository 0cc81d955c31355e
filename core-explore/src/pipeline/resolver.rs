//! Seed artist → MusicBrainz id.

use super::{paced, Degrade};
use crate::mbid::is_mbid;
use crate::models::SeedArtist;
use crate::queue::RateLimitedQueue;
use crate::services::ResolutionService;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Where a resolved id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// The seed carried a valid external id
    SeedExternalId,
    /// The library id itself is an MBID
    SeedLocalId,
    /// An earlier search result cached for this library id
    Cached,
    /// A name search on this call
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub external_id: String,
    pub source: ResolutionSource,
}

impl Resolution {
    fn new(external_id: &str, source: ResolutionSource) -> Self {
        Self {
            external_id: external_id.to_string(),
            source,
        }
    }

    /// Whether the id should be written to the id cache.
    pub fn is_from_search(&self) -> bool {
        self.source == ResolutionSource::Search
    }
}

pub struct MbidResolver {
    service: Arc<dyn ResolutionService>,
    queue: RateLimitedQueue,
    candidate_limit: usize,
}

impl MbidResolver {
    pub fn new(
        service: Arc<dyn ResolutionService>,
        queue: RateLimitedQueue,
        candidate_limit: usize,
    ) -> Self {
        Self {
            service,
            queue,
            candidate_limit: candidate_limit.max(1),
        }
    }

    /// Resolve a seed, searching by name only when no fast path applies.
    ///
    /// `None` for blank names, empty search results and failed searches.
    pub async fn resolve(
        &self,
        seed: &SeedArtist,
        id_map: &BTreeMap<String, String>,
    ) -> Option<Resolution> {
        if let Some(external_id) = seed.external_id.as_deref().map(str::trim) {
            if is_mbid(external_id) {
                return Some(Resolution::new(external_id, ResolutionSource::SeedExternalId));
            }
        }

        if let Some(local_id) = seed.local_id.as_deref().map(str::trim) {
            if is_mbid(local_id) {
                return Some(Resolution::new(local_id, ResolutionSource::SeedLocalId));
            }
            if let Some(cached) = id_map.get(local_id) {
                return Some(Resolution::new(cached, ResolutionSource::Cached));
            }
        }

        let name = seed.display_name.trim().to_string();
        if name.is_empty() {
            debug!("Seed has no name to search for");
            return None;
        }

        let service = Arc::clone(&self.service);
        let limit = self.candidate_limit;
        let query = name.clone();
        let candidates = paced(&self.queue, move || async move {
            service.search_artists(&query, limit).await
        })
        .await
        .degrade("artist search", &name);

        let resolved = candidates
            .into_iter()
            .map(|candidate| candidate.id)
            .find(|id| is_mbid(id));

        match &resolved {
            Some(id) => debug!(artist = %name, mbid = %id, "Resolved seed by name"),
            None => debug!(artist = %name, "No MusicBrainz match for seed"),
        }

        resolved.map(|id| Resolution {
            external_id: id,
            source: ResolutionSource::Search,
        })
    }
}
