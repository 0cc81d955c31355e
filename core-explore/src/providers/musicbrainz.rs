//! MusicBrainz artist search
//!
//! ## API Endpoint
//!
//! - **Search**: `GET {base}/artist/?query=artist:"{name}"&fmt=json&limit={n}`
//!
//! The name is searched as a phrase so multi-word names match as a whole.
//!
//! ## User Agent Requirement
//!
//! MusicBrainz requires every client to identify itself:
//! `ApplicationName/Version (Contact)`. Anonymous clients are limited to one
//! request per second, which the MetaBrainz queue enforces.

use super::{execute_checked, parse_json};
use crate::error::Result;
use crate::models::ArtistCandidate;
use crate::services::ResolutionService;
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_runtime::config::ExploreApiConfig;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "MusicBrainz";

pub struct MusicBrainzClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ArtistSearchResponse {
    #[serde(default)]
    artists: Vec<ArtistSearchResult>,
}

#[derive(Debug, Deserialize)]
struct ArtistSearchResult {
    id: String,
    name: String,
    #[serde(default)]
    score: i32,
}

impl MusicBrainzClient {
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
            api.musicbrainz_base_url.clone(),
            api.musicbrainz_user_agent.clone(),
            api.request_timeout(),
        )
    }

    /// Escape Lucene query syntax; MusicBrainz search is Lucene-backed.
    fn escape_lucene_query(query: &str) -> String {
        const SPECIAL_CHARS: &[char] = &[
            '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':',
            '\\', '/',
        ];

        let mut escaped = String::with_capacity(query.len());
        for c in query.chars() {
            if SPECIAL_CHARS.contains(&c) {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }

    /// Best-first: score descending, exact (case-insensitive) name match
    /// breaking ties.
    fn rank(name: &str, mut results: Vec<ArtistSearchResult>) -> Vec<ArtistCandidate> {
        results.sort_by(|a, b| {
            let a_exact = a.name.eq_ignore_ascii_case(name);
            let b_exact = b.name.eq_ignore_ascii_case(name);
            b.score.cmp(&a.score).then(b_exact.cmp(&a_exact))
        });

        results
            .into_iter()
            .map(|r| ArtistCandidate {
                id: r.id,
                name: r.name,
                score: r.score,
            })
            .collect()
    }
}

#[async_trait]
impl ResolutionService for MusicBrainzClient {
    async fn search_artists(&self, name: &str, limit: usize) -> Result<Vec<ArtistCandidate>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Vec::new());
        }

        let request = HttpRequest::get(format!("{}/artist/", self.base_url))
            .query("query", format!("artist:\"{}\"", Self::escape_lucene_query(name)))
            .query("fmt", "json")
            .query("limit", limit.max(1).to_string())
            .header("User-Agent", self.user_agent.clone())
            .header("Accept", "application/json")
            .timeout(self.timeout);

        debug!(artist = name, "Searching MusicBrainz for artist");

        let response = execute_checked(self.http_client.as_ref(), PROVIDER, request).await?;
        let search: ArtistSearchResponse = parse_json(PROVIDER, &response)?;

        let candidates = Self::rank(name, search.artists);
        debug!(
            artist = name,
            candidates = candidates.len(),
            best = candidates.first().map(|c| c.id.as_str()).unwrap_or("-"),
            "MusicBrainz search finished"
        );

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExploreError;
    use crate::providers::test_support::{json_response, MockHttpClient};
    use bridge_traits::BridgeError;

    const SEARCH_BODY: &str = r#"{
        "created": "2024-05-01T10:00:00.000Z",
        "count": 3,
        "artists": [
            {"id": "11111111-1111-1111-1111-111111111111", "name": "Radiohead Tribute", "score": 80},
            {"id": "a74b1b7f-71a5-4011-9441-d0b5e4122711", "name": "Radiohead", "score": 100},
            {"id": "22222222-2222-2222-2222-222222222222", "name": "On a Friday", "score": 100}
        ]
    }"#;

    fn client(mock: MockHttpClient) -> MusicBrainzClient {
        MusicBrainzClient::new(
            Arc::new(mock),
            "https://musicbrainz.org/ws/2/",
            "ExploreTests/1.0 (tests@example.com)",
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_escape_lucene_query() {
        assert_eq!(MusicBrainzClient::escape_lucene_query("AC/DC"), "AC\\/DC");
        assert_eq!(
            MusicBrainzClient::escape_lucene_query("Artist (Name)"),
            "Artist \\(Name\\)"
        );
        assert_eq!(
            MusicBrainzClient::escape_lucene_query("Sigur Rós"),
            "Sigur Rós"
        );
    }

    #[tokio::test]
    async fn test_search_builds_request_and_ranks() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .withf(|req| {
                req.url == "https://musicbrainz.org/ws/2/artist/"
                    && req.query_value("query") == Some("artist:\"Radiohead\"")
                    && req.query_value("fmt") == Some("json")
                    && req.query_value("limit") == Some("5")
                    && req.headers.get("User-Agent").map(String::as_str)
                        == Some("ExploreTests/1.0 (tests@example.com)")
            })
            .times(1)
            .returning(|_| Ok(json_response(200, SEARCH_BODY)));

        let candidates = client(mock).search_artists("Radiohead", 5).await.unwrap();

        let ids: Vec<_> = candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "a74b1b7f-71a5-4011-9441-d0b5e4122711",
                "22222222-2222-2222-2222-222222222222",
                "11111111-1111-1111-1111-111111111111",
            ]
        );
    }

    #[tokio::test]
    async fn test_multi_word_name_is_a_phrase() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .withf(|req| req.query_value("query") == Some("artist:\"Boards of Canada\""))
            .times(1)
            .returning(|_| Ok(json_response(200, r#"{"count": 0, "artists": []}"#)));

        client(mock).search_artists("Boards of Canada", 5).await.unwrap();
    }

    #[tokio::test]
    async fn test_quotes_in_name_are_escaped_inside_phrase() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .withf(|req| req.query_value("query") == Some(r#"artist:"The \"Fab\" Four""#))
            .times(1)
            .returning(|_| Ok(json_response(200, r#"{"count": 0, "artists": []}"#)));

        client(mock).search_artists("The \"Fab\" Four", 5).await.unwrap();
    }

    #[tokio::test]
    async fn test_blank_name_makes_no_request() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().times(0);

        let candidates = client(mock).search_artists("   ", 5).await.unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_empty_result_set() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .returning(|_| Ok(json_response(200, r#"{"count": 0, "artists": []}"#)));

        assert!(client(mock)
            .search_artists("Nobody", 5)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_service_unavailable_is_http_error() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .returning(|_| Ok(json_response(503, "Service Unavailable")));

        let err = client(mock).search_artists("Radiohead", 5).await.unwrap_err();
        assert!(matches!(err, ExploreError::Http { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .returning(|_| Err(BridgeError::Timeout("30s elapsed".to_string())));

        let err = client(mock).search_artists("Radiohead", 5).await.unwrap_err();
        assert!(matches!(err, ExploreError::Network(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .returning(|_| Ok(json_response(200, "<html>oops</html>")));

        let err = client(mock).search_artists("Radiohead", 5).await.unwrap_err();
        assert!(matches!(err, ExploreError::JsonParse(_)));
    }
}
