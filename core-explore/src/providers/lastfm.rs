//! Last.fm catalog client
//!
//! ## API Methods
//!
//! - `artist.getinfo` by MBID: name, image, bio
//! - `artist.gettopalbums` by MBID, falling back to the artist name when
//!   Last.fm does not know the MBID (error 6)
//! - `tag.gettopalbums`: top albums for a genre tag
//!
//! ## Response quirks
//!
//! - Errors arrive as `{"error": N, "message": "..."}`, sometimes with a 200
//!   status. Error 6 means "not found"; error 29 is the rate limit.
//! - Images without artwork point at a grey star placeholder, which is
//!   treated as no cover.
//! - Some albums come back named `(null)`; they are dropped.
//! - Bios end with a "Read more on Last.fm" anchor.
//!
//! The API key is never logged.

use super::{ensure_success, parse_json};
use crate::error::{ExploreError, Result};
use crate::models::{ExternalAlbumSummary, ExternalArtistSummary};
use crate::services::CatalogService;
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use core_runtime::config::ExploreApiConfig;
use core_runtime::logging::redact_if_sensitive;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "Last.fm";

/// Hash of the grey star image Last.fm serves when it has no artwork.
const PLACEHOLDER_IMAGE_HASH: &str = "2a96cbd8b46e442fc41c2b86b821562f";

const ERROR_NOT_FOUND: i64 = 6;
const ERROR_RATE_LIMIT: i64 = 29;

static READ_MORE_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s+href="https?://www\.last\.fm/[^"]*"[^>]*>\s*Read more on Last\.fm\s*</a>\.?"#)
        .expect("read-more pattern is a valid regex")
});

static HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[^>]+>").expect("tag pattern is a valid regex"));

pub struct LastFmClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Image {
    #[serde(rename = "#text", default)]
    url: String,
    #[serde(default)]
    size: String,
}

#[derive(Debug, Deserialize)]
struct ArtistInfoResponse {
    artist: ArtistInfo,
}

#[derive(Debug, Deserialize)]
struct ArtistInfo {
    name: String,
    #[serde(default)]
    image: Vec<Image>,
    bio: Option<Bio>,
}

#[derive(Debug, Deserialize)]
struct Bio {
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Deserialize)]
struct TopAlbumsResponse {
    topalbums: AlbumList,
}

#[derive(Debug, Deserialize)]
struct TagAlbumsResponse {
    albums: AlbumList,
}

#[derive(Debug, Deserialize)]
struct AlbumList {
    #[serde(default, deserialize_with = "one_or_many")]
    album: Vec<AlbumRow>,
}

#[derive(Debug, Deserialize)]
struct AlbumRow {
    name: String,
    #[serde(default)]
    mbid: Option<String>,
    #[serde(default)]
    url: Option<String>,
    artist: AlbumArtist,
    #[serde(default)]
    image: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct AlbumArtist {
    name: String,
    #[serde(default)]
    mbid: Option<String>,
}

/// Last.fm collapses single-element lists into a bare object.
fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl LastFmClient {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            api_key: non_empty(api_key),
            timeout,
        }
    }

    pub fn from_config(http_client: Arc<dyn HttpClient>, api: &ExploreApiConfig) -> Self {
        Self::new(
            http_client,
            api.lastfm_base_url.clone(),
            api.lastfm_api_key.clone(),
            api.request_timeout(),
        )
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Call an API method. `Ok(None)` when Last.fm answers "not found".
    async fn call(&self, method: &str, params: &[(&str, String)]) -> Result<Option<HttpResponse>> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ExploreError::Config("Last.fm API key is not configured".to_string())
        })?;

        let mut request = HttpRequest::get(self.base_url.clone())
            .query("method", method)
            .query("api_key", api_key)
            .query("format", "json")
            .header("Accept", "application/json")
            .timeout(self.timeout);
        for (key, value) in params {
            request = request.query(*key, value.clone());
        }

        debug!(method, "Querying Last.fm");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| {
                // Transport errors may echo the request URL.
                let message =
                    redact_if_sensitive("error", &e.to_string()).replace(api_key, "[REDACTED]");
                ExploreError::Network(format!("Last.fm request failed: {}", message))
            })?;

        if let Ok(error) = serde_json::from_slice::<ErrorResponse>(&response.body) {
            return match error.error {
                ERROR_NOT_FOUND => {
                    debug!(method, "Last.fm has no match");
                    Ok(None)
                }
                ERROR_RATE_LIMIT => Err(ExploreError::RateLimited {
                    provider: PROVIDER.to_string(),
                    retry_after_seconds: 60,
                }),
                code => Err(ExploreError::RemoteApi(format!(
                    "Last.fm API error {}: {}",
                    code, error.message
                ))),
            };
        }

        ensure_success(PROVIDER, response).map(Some)
    }

    /// Preferred sizes: mega > extralarge > large > medium > anything.
    fn best_image(images: &[Image]) -> Option<String> {
        ["mega", "extralarge", "large", "medium"]
            .iter()
            .find_map(|size| images.iter().find(|img| img.size == *size && !img.url.is_empty()))
            .or_else(|| images.iter().find(|img| !img.url.is_empty()))
            .map(|img| img.url.clone())
            .filter(|url| !url.contains(PLACEHOLDER_IMAGE_HASH))
    }

    fn clean_bio(summary: &str) -> Option<String> {
        let without_anchor = READ_MORE_ANCHOR.replace_all(summary, "");
        let text = HTML_TAG.replace_all(&without_anchor, "");
        let cleaned = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }

    fn to_albums(rows: Vec<AlbumRow>, limit: usize) -> Vec<ExternalAlbumSummary> {
        let mut seen = HashSet::new();
        rows.into_iter()
            .filter(|row| {
                let name = row.name.trim();
                !name.is_empty() && name != "(null)"
            })
            .map(|row| {
                let cover_url = Self::best_image(&row.image);
                let id = non_empty(row.mbid.clone())
                    .or_else(|| non_empty(row.url.clone()))
                    .unwrap_or_else(|| format!("{}::{}", row.artist.name, row.name));
                ExternalAlbumSummary {
                    id,
                    name: row.name,
                    artist_name: row.artist.name,
                    artist_id: non_empty(row.artist.mbid),
                    cover_url,
                }
            })
            .filter(|album| seen.insert(album.id.clone()))
            .take(limit)
            .collect()
    }

    async fn top_albums(&self, params: &[(&str, String)], limit: usize) -> Result<Option<Vec<ExternalAlbumSummary>>> {
        let Some(response) = self.call("artist.gettopalbums", params).await? else {
            return Ok(None);
        };
        let parsed: TopAlbumsResponse = parse_json(PROVIDER, &response)?;
        Ok(Some(Self::to_albums(parsed.topalbums.album, limit)))
    }
}

#[async_trait]
impl CatalogService for LastFmClient {
    async fn artist(&self, external_id: &str) -> Result<Option<ExternalArtistSummary>> {
        let Some(response) = self
            .call("artist.getinfo", &[("mbid", external_id.to_string())])
            .await?
        else {
            return Ok(None);
        };

        let parsed: ArtistInfoResponse = parse_json(PROVIDER, &response)?;
        let info = parsed.artist;
        Ok(Some(ExternalArtistSummary {
            id: external_id.to_string(),
            name: info.name,
            cover_url: Self::best_image(&info.image),
            bio: info.bio.and_then(|bio| Self::clean_bio(&bio.summary)),
        }))
    }

    async fn artist_albums(
        &self,
        external_id: &str,
        name: &str,
        limit: usize,
    ) -> Result<Vec<ExternalAlbumSummary>> {
        // Over-fetch: (null) rows and duplicates are dropped after parsing.
        let fetch_limit = (limit * 2).max(1).to_string();

        if !external_id.is_empty() {
            let params = [("mbid", external_id.to_string()), ("limit", fetch_limit.clone())];
            if let Some(albums) = self.top_albums(&params, limit).await? {
                return Ok(albums);
            }
        }

        let name = name.trim();
        if name.is_empty() {
            return Ok(Vec::new());
        }

        debug!(artist = name, "Falling back to artist name for top albums");
        let params = [
            ("artist", name.to_string()),
            ("autocorrect", "1".to_string()),
            ("limit", fetch_limit),
        ];
        Ok(self.top_albums(&params, limit).await?.unwrap_or_default())
    }

    async fn top_albums_for_genre(
        &self,
        genre: &str,
        limit: usize,
    ) -> Result<Vec<ExternalAlbumSummary>> {
        let genre = genre.trim();
        if genre.is_empty() {
            return Ok(Vec::new());
        }

        let params = [
            ("tag", genre.to_string()),
            ("limit", (limit * 2).max(1).to_string()),
        ];
        let Some(response) = self.call("tag.gettopalbums", &params).await? else {
            return Ok(Vec::new());
        };

        let parsed: TagAlbumsResponse = parse_json(PROVIDER, &response)?;
        Ok(Self::to_albums(parsed.albums.album, limit))
    }
}
