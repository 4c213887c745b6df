//! API client for the challenges server.
//!
//! Fetches the live challenger and database snapshots for a session and
//! performs the full-replace `PUT` used to restore them.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::{ApiError, OverwriteTransport};
use crate::models::{DataSnapshot, ProgressSnapshot, SnapshotKind};
use crate::session::SessionId;

// ============================================================================
// Constants
// ============================================================================

/// Public challenges server
pub const DEFAULT_BASE_URL: &str = "https://apichallenges.eviltester.com";

/// HTTP request timeout in seconds.
/// Also bounds a restore whose acknowledgment never arrives.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) fetches.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Client for the challenges server.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid server base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Server base URL cannot have a path: {}", base_url);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `/challenger/{id}` for progress, `/challenger/database/{id}` for data.
    /// The id is percent-encoded as a single path segment.
    pub fn resource_url(&self, kind: SnapshotKind, id: &SessionId) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().push("challenger");
            if kind == SnapshotKind::Data {
                segments.push("database");
            }
            segments.push(id.as_str());
        }
        Ok(url)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(url.clone())
                .header(header::ACCEPT, "application/json")
                .send()
                .await?;

            match Self::check_response(response).await {
                Ok(response) => {
                    let text = response.text().await?;
                    return serde_json::from_str(&text).map_err(|e| {
                        ApiError::InvalidResponse(format!("Failed to parse JSON from {}: {}", url, e))
                    });
                }
                Err(ApiError::RateLimited) => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
                Err(e) => return Err(e),
            }
        }
    }

    // ===== Live State =====

    /// Fetch the live challenger (progress) object for a session
    pub async fn fetch_progress(&self, id: &SessionId) -> Result<ProgressSnapshot, ApiError> {
        let url = self.resource_url(SnapshotKind::Progress, id)?;
        debug!(session = %id, "Fetching challenger progress");
        self.get(url).await
    }

    /// Fetch the live todo database for a session
    pub async fn fetch_data(&self, id: &SessionId) -> Result<DataSnapshot, ApiError> {
        let url = self.resource_url(SnapshotKind::Data, id)?;
        debug!(session = %id, "Fetching challenger database");
        self.get(url).await
    }

    /// Fetch both snapshots concurrently. Each half fails independently: a
    /// session may have progress but no database yet.
    pub async fn fetch_live(&self, id: &SessionId) -> LiveState {
        let (progress, data) =
            futures::future::join(self.fetch_progress(id), self.fetch_data(id)).await;
        LiveState { progress, data }
    }
}

/// Live server state for one session
#[derive(Debug)]
pub struct LiveState {
    pub progress: Result<ProgressSnapshot, ApiError>,
    pub data: Result<DataSnapshot, ApiError>,
}

impl LiveState {
    pub fn progress(&self) -> Option<&ProgressSnapshot> {
        self.progress.as_ref().ok()
    }

    pub fn data(&self) -> Option<&DataSnapshot> {
        self.data.as_ref().ok()
    }
}

#[async_trait]
impl OverwriteTransport for ApiClient {
    /// Single `PUT`, never retried. An empty acknowledgment body reads as `null`.
    async fn overwrite(
        &self,
        kind: SnapshotKind,
        id: &SessionId,
        body: String,
    ) -> Result<Value, ApiError> {
        let url = self.resource_url(kind, id)?;

        let response = self
            .client
            .put(url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .body(body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse acknowledgment from {}: {}", url, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> SessionId {
        SessionId::new(s).unwrap()
    }

    #[test]
    fn test_resource_urls() {
        let client = ApiClient::new("https://example.test").unwrap();
        assert_eq!(
            client.resource_url(SnapshotKind::Progress, &id("abc")).unwrap().as_str(),
            "https://example.test/challenger/abc"
        );
        assert_eq!(
            client.resource_url(SnapshotKind::Data, &id("abc")).unwrap().as_str(),
            "https://example.test/challenger/database/abc"
        );
    }

    #[test]
    fn test_resource_url_keeps_base_path() {
        let client = ApiClient::new("http://localhost:4567/api/").unwrap();
        assert_eq!(
            client.resource_url(SnapshotKind::Data, &id("abc")).unwrap().as_str(),
            "http://localhost:4567/api/challenger/database/abc"
        );
    }

    #[test]
    fn test_resource_url_encodes_id() {
        let client = ApiClient::new("https://example.test").unwrap();
        let url = client.resource_url(SnapshotKind::Progress, &id("a/b?c")).unwrap();
        assert_eq!(url.as_str(), "https://example.test/challenger/a%2Fb%3Fc");
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(ApiClient::new("not a url").is_err());
        assert!(ApiClient::new("mailto:someone@example.test").is_err());
    }
}
