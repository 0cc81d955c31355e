//! ListenBrainz labs similar-artist lookup
//!
//! `GET {base}/similar-artists/json?artist_mbids={mbid}&algorithm={alg}`
//!
//! The labs endpoint is experimental and its payload has changed shape over
//! time. Two forms are accepted:
//!
//! - a flat array of `{artist_mbid, name, score}` rows
//! - the older dataset form, `[{...header...}, {"type": "dataset", "data": [rows]}]`
//!
//! Rows without a well-formed MBID are dropped, as is the reference artist.

use super::{execute_checked, parse_json};
use crate::error::{ExploreError, Result};
use crate::mbid::is_mbid;
use crate::models::SimilarArtistRef;
use crate::services::SimilarityService;
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_runtime::config::ExploreApiConfig;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "ListenBrainz";

pub struct ListenBrainzClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SimilarArtistRow {
    artist_mbid: Option<String>,
    name: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

impl ListenBrainzClient {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
            timeout,
        }
    }

    pub fn from_config(http_client: Arc<dyn HttpClient>, api: &ExploreApiConfig) -> Self {
        Self::new(
            http_client,
            api.listenbrainz_base_url.clone(),
            api.musicbrainz_user_agent.clone(),
            api.request_timeout(),
        )
    }

    fn rows(payload: Value) -> Result<Vec<Value>> {
        let Value::Array(items) = payload else {
            return Err(ExploreError::JsonParse(
                "ListenBrainz similar-artists payload is not an array".to_string(),
            ));
        };

        let is_dataset = |item: &Value| item.get("type").and_then(Value::as_str) == Some("dataset");
        if !items.iter().any(is_dataset) {
            return Ok(items);
        }

        Ok(items
            .into_iter()
            .filter(is_dataset)
            .filter_map(|mut item| match item.get_mut("data").map(Value::take) {
                Some(Value::Array(rows)) => Some(rows),
                _ => None,
            })
            .flatten()
            .collect())
    }

    fn parse_similar(payload: Value, reference: &str, limit: usize) -> Result<Vec<SimilarArtistRef>> {
        let mut seen = HashSet::new();
        let mut similar: Vec<SimilarArtistRef> = Self::rows(payload)?
            .into_iter()
            .filter_map(|row| serde_json::from_value::<SimilarArtistRow>(row).ok())
            .filter_map(|row| {
                let external_id = row.artist_mbid?.trim().to_lowercase();
                if !is_mbid(&external_id) || external_id == reference {
                    return None;
                }
                Some(SimilarArtistRef {
                    external_id,
                    name: row.name.filter(|n| !n.trim().is_empty()),
                    score: row.score.unwrap_or(0.0),
                })
            })
            .filter(|r| seen.insert(r.external_id.clone()))
            .collect();

        similar.sort_by(|a, b| b.score.total_cmp(&a.score));
        similar.truncate(limit);
        Ok(similar)
    }
}

#[async_trait]
impl SimilarityService for ListenBrainzClient {
    async fn similar_artists(
        &self,
        external_id: &str,
        limit: usize,
        algorithm: &str,
    ) -> Result<Vec<SimilarArtistRef>> {
        let external_id = external_id.trim();
        if external_id.is_empty() {
            return Ok(Vec::new());
        }

        let request = HttpRequest::get(format!("{}/similar-artists/json", self.base_url))
            .query("artist_mbids", external_id)
            .query("algorithm", algorithm)
            .header("User-Agent", self.user_agent.clone())
            .header("Accept", "application/json")
            .timeout(self.timeout);

        debug!(artist_mbid = external_id, "Fetching similar artists");

        let response = execute_checked(self.http_client.as_ref(), PROVIDER, request).await?;
        let payload: Value = parse_json(PROVIDER, &response)?;
        let similar = Self::parse_similar(payload, external_id, limit)?;

        debug!(
            artist_mbid = external_id,
            similar = similar.len(),
            "Similar artists fetched"
        );
        Ok(similar)
    }
}
