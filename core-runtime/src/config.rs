//! # Explore Configuration Module
//!
//! Configuration for the explore discovery core.
//!
//! ## Overview
//!
//! [`ExploreConfig`] is assembled through a builder and validated fail-fast:
//! a missing `HttpClient` or an ill-formed API setting is reported before any
//! controller exists. It carries three things:
//!
//! - the `HttpClient` bridge (desktop default: reqwest, behind `desktop-shims`)
//! - [`ExploreApiConfig`]: endpoints and credentials for MusicBrainz,
//!   ListenBrainz labs and Last.fm
//! - [`DiscoveryTuning`]: pacing and sizing of a discovery run
//!
//! Both value sections deserialize from JSON with per-field defaults, so a
//! host can ship a partial document.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{ExploreApiConfig, ExploreConfig};
//!
//! let config = ExploreConfig::builder()
//!     .api(
//!         ExploreApiConfig::default()
//!             .with_musicbrainz_user_agent("Sonar/1.4 (dev@example.com)")
//!             .with_lastfm_api_key(std::env::var("LASTFM_API_KEY")?),
//!     )
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! Without the `desktop-shims` feature, forgetting the HTTP client is a
//! [`Error::CapabilityMissing`]:
//!
//! ```ignore
//! let err = ExploreConfig::builder().build().unwrap_err();
//! assert!(matches!(err, Error::CapabilityMissing { .. }));
//! ```

use crate::error::{Error, Result};
use bridge_traits::HttpClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MUSICBRAINZ_BASE_URL: &str = "https://musicbrainz.org/ws/2";
pub const DEFAULT_LISTENBRAINZ_LABS_BASE_URL: &str = "https://labs.api.listenbrainz.org";
pub const DEFAULT_LASTFM_BASE_URL: &str = "https://ws.audioscrobbler.com/2.0/";
pub const DEFAULT_USER_AGENT: &str = "ExploreCore/0.1 (https://github.com/explore-core)";

/// Similarity model used by the ListenBrainz labs endpoint.
pub const DEFAULT_SIMILARITY_ALGORITHM: &str =
    "session_based_days_7500_session_300_contribution_5_threshold_10_limit_100_filter_True_skip_30";

const MAX_SPACING_MS: u64 = 60_000;

/// Complete configuration for an explore controller.
#[derive(Clone)]
pub struct ExploreConfig {
    pub http_client: Arc<dyn HttpClient>,
    pub api: ExploreApiConfig,
    pub tuning: DiscoveryTuning,
}

impl std::fmt::Debug for ExploreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExploreConfig")
            .field("http_client", &"HttpClient { ... }")
            .field("api", &self.api)
            .field("tuning", &self.tuning)
            .finish()
    }
}

impl ExploreConfig {
    pub fn builder() -> ExploreConfigBuilder {
        ExploreConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;
        self.tuning.validate()
    }
}

/// Endpoints and credentials for the external metadata services.
///
/// # Security Note
///
/// The Last.fm API key is a credential. Load it from the environment or the
/// host's secure configuration; it is redacted from forwarded logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploreApiConfig {
    /// User agent sent to MusicBrainz and ListenBrainz.
    ///
    /// MusicBrainz requires `ApplicationName/Version (Contact)`.
    /// See: https://musicbrainz.org/doc/MusicBrainz_API/Rate_Limiting
    pub musicbrainz_user_agent: String,

    /// Last.fm API key. Catalog calls degrade to empty results without one.
    pub lastfm_api_key: Option<String>,

    pub musicbrainz_base_url: String,
    pub listenbrainz_base_url: String,
    pub lastfm_base_url: String,

    /// Per-request transport timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ExploreApiConfig {
    fn default() -> Self {
        Self {
            musicbrainz_user_agent: DEFAULT_USER_AGENT.to_string(),
            lastfm_api_key: None,
            musicbrainz_base_url: DEFAULT_MUSICBRAINZ_BASE_URL.to_string(),
            listenbrainz_base_url: DEFAULT_LISTENBRAINZ_LABS_BASE_URL.to_string(),
            lastfm_base_url: DEFAULT_LASTFM_BASE_URL.to_string(),
            request_timeout_ms: 15_000,
        }
    }
}

impl std::fmt::Debug for ExploreApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExploreApiConfig")
            .field("musicbrainz_user_agent", &self.musicbrainz_user_agent)
            .field("lastfm_api_key", &self.lastfm_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("musicbrainz_base_url", &self.musicbrainz_base_url)
            .field("listenbrainz_base_url", &self.listenbrainz_base_url)
            .field("lastfm_base_url", &self.lastfm_base_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl ExploreApiConfig {
    pub fn with_musicbrainz_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.musicbrainz_user_agent = user_agent.into();
        self
    }

    pub fn with_lastfm_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.lastfm_api_key = Some(api_key.into());
        self
    }

    pub fn with_musicbrainz_base_url(mut self, url: impl Into<String>) -> Self {
        self.musicbrainz_base_url = url.into();
        self
    }

    pub fn with_listenbrainz_base_url(mut self, url: impl Into<String>) -> Self {
        self.listenbrainz_base_url = url.into();
        self
    }

    pub fn with_lastfm_base_url(mut self, url: impl Into<String>) -> Self {
        self.lastfm_base_url = url.into();
        self
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn has_lastfm(&self) -> bool {
        self.lastfm_api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn validate(&self) -> Result<()> {
        let ua = self.musicbrainz_user_agent.trim();
        if ua.is_empty() {
            return Err(Error::Config(
                "MusicBrainz user agent cannot be empty".to_string(),
            ));
        }
        if !ua.contains('/') || !ua.contains('(') || !ua.contains(')') {
            return Err(Error::Config(
                "MusicBrainz user agent must follow format: 'AppName/Version (Contact)'"
                    .to_string(),
            ));
        }

        if let Some(key) = &self.lastfm_api_key {
            if key.trim().is_empty() {
                return Err(Error::Config(
                    "Last.fm API key is set but empty. Omit it to disable Last.fm.".to_string(),
                ));
            }
        }

        for (name, url) in [
            ("MusicBrainz", &self.musicbrainz_base_url),
            ("ListenBrainz", &self.listenbrainz_base_url),
            ("Last.fm", &self.lastfm_base_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(Error::Config(format!(
                    "{} base URL must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }

        if self.request_timeout_ms == 0 {
            return Err(Error::Config(
                "Request timeout must be greater than 0ms".to_string(),
            ));
        }

        Ok(())
    }
}

/// Pacing and sizing of a discovery run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryTuning {
    /// Minimum spacing between MusicBrainz/ListenBrainz requests.
    ///
    /// MusicBrainz allows one request per second for anonymous clients.
    pub metabrainz_spacing_ms: u64,
    /// Minimum spacing between Last.fm requests
    pub catalog_spacing_ms: u64,
    /// Similar artists wanted after the first full pass
    pub bootstrap_target: usize,
    /// Similar artists added by each later run
    pub top_up_increment: usize,
    pub similar_limit: usize,
    pub similarity_algorithm: String,
    /// Cap on albums appended to one similar artist
    pub albums_per_artist: usize,
    pub genre_album_limit: usize,
    pub search_candidate_limit: usize,
    /// Genres sampled for genre rows
    pub genre_row_count: usize,
}

impl Default for DiscoveryTuning {
    fn default() -> Self {
        Self {
            metabrainz_spacing_ms: 1_000,
            catalog_spacing_ms: 250,
            bootstrap_target: 20,
            top_up_increment: 4,
            similar_limit: 25,
            similarity_algorithm: DEFAULT_SIMILARITY_ALGORITHM.to_string(),
            albums_per_artist: 6,
            genre_album_limit: 12,
            search_candidate_limit: 5,
            genre_row_count: 3,
        }
    }
}

impl DiscoveryTuning {
    pub fn with_spacing(mut self, metabrainz_ms: u64, catalog_ms: u64) -> Self {
        self.metabrainz_spacing_ms = metabrainz_ms;
        self.catalog_spacing_ms = catalog_ms;
        self
    }

    pub fn with_bootstrap_target(mut self, target: usize) -> Self {
        self.bootstrap_target = target;
        self
    }

    pub fn with_top_up_increment(mut self, increment: usize) -> Self {
        self.top_up_increment = increment;
        self
    }

    pub fn with_albums_per_artist(mut self, cap: usize) -> Self {
        self.albums_per_artist = cap;
        self
    }

    pub fn metabrainz_spacing(&self) -> Duration {
        Duration::from_millis(self.metabrainz_spacing_ms)
    }

    pub fn catalog_spacing(&self) -> Duration {
        Duration::from_millis(self.catalog_spacing_ms)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, spacing) in [
            ("MetaBrainz", self.metabrainz_spacing_ms),
            ("Catalog", self.catalog_spacing_ms),
        ] {
            if spacing == 0 {
                return Err(Error::Config(format!(
                    "{} spacing must be greater than 0ms",
                    name
                )));
            }
            if spacing > MAX_SPACING_MS {
                return Err(Error::Config(format!(
                    "{} spacing exceeds maximum of 60 seconds (60,000ms)",
                    name
                )));
            }
        }

        if self.bootstrap_target == 0 {
            return Err(Error::Config(
                "Bootstrap target must be at least 1".to_string(),
            ));
        }
        if self.top_up_increment == 0 {
            return Err(Error::Config(
                "Top-up increment must be at least 1".to_string(),
            ));
        }
        if self.similar_limit == 0 || self.search_candidate_limit == 0 {
            return Err(Error::Config(
                "Similar and search limits must be at least 1".to_string(),
            ));
        }
        if self.similarity_algorithm.trim().is_empty() {
            return Err(Error::Config(
                "Similarity algorithm cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(api: &ExploreApiConfig) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(api.request_timeout())?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_api: &ExploreApiConfig) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for MusicBrainz, ListenBrainz and Last.fm. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Mobile: inject the platform HTTP stack (URLSession/OkHttp)."
            .to_string(),
    })
}

/// Builder for [`ExploreConfig`].
#[derive(Default)]
pub struct ExploreConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    api: Option<ExploreApiConfig>,
    tuning: Option<DiscoveryTuning>,
}

impl ExploreConfigBuilder {
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn api(mut self, api: ExploreApiConfig) -> Self {
        self.api = Some(api);
        self
    }

    pub fn tuning(mut self, tuning: DiscoveryTuning) -> Self {
        self.tuning = Some(tuning);
        self
    }

    /// Validates settings, then resolves the HTTP client.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] for ill-formed API settings or tuning
    /// - [`Error::CapabilityMissing`] when no client was injected and no
    ///   platform default is compiled in
    pub fn build(self) -> Result<ExploreConfig> {
        let api = self.api.unwrap_or_default();
        let tuning = self.tuning.unwrap_or_default();
        api.validate()?;
        tuning.validate()?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(&api)?,
        };

        Ok(ExploreConfig {
            http_client,
            api,
            tuning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{error::Result as BridgeResult, HttpRequest, HttpResponse};

    struct NoopHttpClient;

    #[async_trait]
    impl HttpClient for NoopHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse::new(200, "{}"))
        }
    }

    #[test]
    fn test_builder_with_injected_client() {
        let config = ExploreConfig::builder()
            .http_client(Arc::new(NoopHttpClient))
            .api(ExploreApiConfig::default().with_lastfm_api_key("key"))
            .build()
            .unwrap();

        assert!(config.api.has_lastfm());
        assert_eq!(config.tuning, DiscoveryTuning::default());
        assert!(config.validate().is_ok());
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_http_client_is_capability_error() {
        let err = ExploreConfig::builder().build().unwrap_err();
        match err {
            Error::CapabilityMissing { capability, .. } => assert_eq!(capability, "HttpClient"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_user_agent_validation() {
        let api = ExploreApiConfig::default().with_musicbrainz_user_agent("no-contact");
        assert!(matches!(api.validate(), Err(Error::Config(_))));

        let api = ExploreApiConfig::default().with_musicbrainz_user_agent("   ");
        assert!(api.validate().is_err());

        let api = ExploreApiConfig::default().with_musicbrainz_user_agent("App/1.0 (me@example.com)");
        assert!(api.validate().is_ok());
    }

    #[test]
    fn test_empty_lastfm_key_rejected() {
        let api = ExploreApiConfig::default().with_lastfm_api_key("  ");
        assert!(api.validate().is_err());
        assert!(!api.has_lastfm());
    }

    #[test]
    fn test_base_url_must_be_http() {
        let api = ExploreApiConfig::default().with_lastfm_base_url("ftp://ws.audioscrobbler.com");
        assert!(api.validate().is_err());
    }

    #[test]
    fn test_tuning_defaults() {
        let tuning = DiscoveryTuning::default();
        assert_eq!(tuning.bootstrap_target, 20);
        assert_eq!(tuning.top_up_increment, 4);
        assert_eq!(tuning.similar_limit, 25);
        assert_eq!(tuning.albums_per_artist, 6);
        assert_eq!(tuning.genre_album_limit, 12);
        assert_eq!(tuning.metabrainz_spacing(), Duration::from_secs(1));
        assert_eq!(tuning.similarity_algorithm, DEFAULT_SIMILARITY_ALGORITHM);
    }

    #[test]
    fn test_tuning_spacing_bounds() {
        assert!(DiscoveryTuning::default().with_spacing(0, 250).validate().is_err());
        assert!(DiscoveryTuning::default().with_spacing(1000, 60_001).validate().is_err());
        assert!(DiscoveryTuning::default().with_spacing(60_000, 1).validate().is_ok());
        assert!(DiscoveryTuning::default().with_bootstrap_target(0).validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning: DiscoveryTuning =
            serde_json::from_str(r#"{"bootstrap_target": 30, "catalog_spacing_ms": 500}"#).unwrap();
        assert_eq!(tuning.bootstrap_target, 30);
        assert_eq!(tuning.catalog_spacing_ms, 500);
        assert_eq!(tuning.top_up_increment, 4);

        let api: ExploreApiConfig = serde_json::from_str(r#"{"lastfm_api_key": "abc"}"#).unwrap();
        assert_eq!(api.musicbrainz_base_url, DEFAULT_MUSICBRAINZ_BASE_URL);
        assert!(api.has_lastfm());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let api = ExploreApiConfig::default().with_lastfm_api_key("super-secret");
        let rendered = format!("{:?}", api);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
