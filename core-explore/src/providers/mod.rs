//! External metadata service clients
//!
//! - [`MusicBrainzClient`] resolves artist names to MBIDs
//! - [`ListenBrainzClient`] looks up similar artists on the labs API
//! - [`LastFmClient`] supplies artist info, artist albums and genre albums
//!
//! None of the clients pace their own traffic; callers route them through a
//! [`RateLimitedQueue`](crate::queue::RateLimitedQueue).

pub mod lastfm;
pub mod listenbrainz;
pub mod musicbrainz;

pub use lastfm::LastFmClient;
pub use listenbrainz::ListenBrainzClient;
pub use musicbrainz::MusicBrainzClient;

use crate::error::{ExploreError, Result};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;

/// Bodies longer than this are cut in error messages.
const MAX_ERROR_BODY: usize = 256;

/// Execute `request` and turn non-success statuses into errors.
async fn execute_checked(
    http_client: &dyn HttpClient,
    provider: &str,
    request: HttpRequest,
) -> Result<HttpResponse> {
    let response = http_client
        .execute(request)
        .await
        .map_err(|e| ExploreError::Network(format!("{} request failed: {}", provider, e)))?;

    ensure_success(provider, response)
}

fn ensure_success(provider: &str, response: HttpResponse) -> Result<HttpResponse> {
    if response.status == 429 {
        let retry_after_seconds = response
            .header("Retry-After")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(60);
        return Err(ExploreError::RateLimited {
            provider: provider.to_string(),
            retry_after_seconds,
        });
    }

    if !response.is_success() {
        let body = String::from_utf8_lossy(&response.body);
        return Err(ExploreError::Http {
            status: response.status,
            body: body.chars().take(MAX_ERROR_BODY).collect(),
        });
    }

    Ok(response)
}

fn parse_json<T: DeserializeOwned>(provider: &str, response: &HttpResponse) -> Result<T> {
    serde_json::from_slice(&response.body).map_err(|e| {
        ExploreError::JsonParse(format!("Failed to parse {} response: {}", provider, e))
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use bridge_traits::error::Result;
    use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
    use mockall::mock;

    mock! {
        pub HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    pub fn json_response(status: u16, body: &str) -> HttpResponse {
        let mut response = HttpResponse::new(status, body.to_string());
        response
            .headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        response
    }
}
