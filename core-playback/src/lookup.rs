//! # Remote Lookup
//!
//! Queries the song search service for playable audio links.
//!
//! ```text
//! GET {endpoint}?query=<url-encoded query>
//!
//! { "success": true,
//!   "data": { "results": [ { "downloadUrl": [ { "quality": "12kbps",  "url": "..." },
//!                                             { "quality": "320kbps", "url": "..." } ] } ] } }
//! ```
//!
//! Links come back lowest quality first; candidates are returned highest
//! quality first. Only the first result is used.

use crate::error::{PlaybackError, Result};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, RetryPolicy};
use core_runtime::config::{CoreConfig, DEFAULT_SEARCH_ENDPOINT};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Source of candidate audio URLs for a query.
#[async_trait]
pub trait AudioLookup: Send + Sync {
    /// Candidate URLs for `query`, best first. Empty when nothing usable
    /// came back, whatever the reason.
    async fn lookup(&self, query: &str) -> Vec<String>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    success: bool,
    data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    results: Option<Vec<SearchResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    download_url: Option<Vec<DownloadLink>>,
}

/// Some mirrors name the field `link` instead of `url`.
#[derive(Debug, Deserialize)]
struct DownloadLink {
    url: Option<String>,
    link: Option<String>,
}

impl DownloadLink {
    fn into_url(self) -> Option<String> {
        self.url
            .or(self.link)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
    }
}

/// Extract candidate URLs from a search response body.
fn parse_candidates(body: &[u8]) -> Result<Vec<String>> {
    let response: SearchResponse = serde_json::from_slice(body)
        .map_err(|e| PlaybackError::MalformedResponse(e.to_string()))?;

    if !response.success {
        return Err(PlaybackError::LookupUnsuccessful);
    }

    let links = response
        .data
        .and_then(|data| data.results)
        .and_then(|results| results.into_iter().next())
        .and_then(|first| first.download_url)
        .unwrap_or_default();

    Ok(links
        .into_iter()
        .rev()
        .filter_map(DownloadLink::into_url)
        .collect())
}

/// [`AudioLookup`] over the song search HTTP API.
pub struct SongSearchClient {
    http: Arc<dyn HttpClient>,
    endpoint: String,
    timeout: Option<Duration>,
}

impl SongSearchClient {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            timeout: None,
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.http_client.clone())
            .with_endpoint(config.search_endpoint.clone())
            .with_timeout(config.lookup_timeout)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Per-request timeout; `None` keeps the transport default.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_url(&self, query: &str) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{}query={}",
            self.endpoint,
            separator,
            urlencoding::encode(query)
        )
    }

    /// One search request, with failures kept typed.
    pub async fn search(&self, query: &str) -> Result<Vec<String>> {
        let request =
            HttpRequest::new(HttpMethod::Get, self.request_url(query)).timeout_opt(self.timeout);

        let response = self
            .http
            .execute_with_retry(request, RetryPolicy::single_attempt())
            .await
            .map_err(|e| PlaybackError::LookupFailed(e.to_string()))?;

        if !response.is_success() {
            return Err(PlaybackError::LookupStatus(response.status));
        }

        parse_candidates(&response.body)
    }
}

#[async_trait]
impl AudioLookup for SongSearchClient {
    async fn lookup(&self, query: &str) -> Vec<String> {
        match self.search(query).await {
            Ok(urls) => {
                debug!(query = query, count = urls.len(), "Lookup completed");
                urls
            }
            Err(e) => {
                warn!(query = query, error = %e, "Lookup failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reverses_and_filters() {
        let body = br#"{
            "success": true,
            "data": { "results": [
                { "downloadUrl": [
                    { "quality": "12kbps", "url": "https://cdn/12.mp4" },
                    { "quality": "48kbps", "url": "" },
                    { "quality": "160kbps", "url": null },
                    { "quality": "320kbps", "url": "https://cdn/320.mp4" }
                ] },
                { "downloadUrl": [ { "quality": "320kbps", "url": "https://cdn/other.mp4" } ] }
            ] }
        }"#;

        assert_eq!(
            parse_candidates(body).unwrap(),
            vec!["https://cdn/320.mp4", "https://cdn/12.mp4"]
        );
    }

    #[test]
    fn test_parse_highest_quality_first() {
        let body = br#"{"success": true, "data": {"results": [
            {"downloadUrl": [{"url": "low"}, {"url": "high"}]}
        ]}}"#;
        assert_eq!(parse_candidates(body).unwrap(), vec!["high", "low"]);
    }

    #[test]
    fn test_parse_accepts_link_field() {
        let body = br#"{"success": true, "data": {"results": [
            {"downloadUrl": [{"quality": "96kbps", "link": "https://mirror/96"},
                             {"quality": "320kbps", "link": "https://mirror/320"}]}
        ]}}"#;

        assert_eq!(
            parse_candidates(body).unwrap(),
            vec!["https://mirror/320", "https://mirror/96"]
        );
    }

    #[test]
    fn test_parse_failures() {
        assert!(matches!(
            parse_candidates(br#"{"success": false, "data": {"results": []}}"#),
            Err(PlaybackError::LookupUnsuccessful)
        ));
        assert!(matches!(
            parse_candidates(br#"{"data": {}}"#),
            Err(PlaybackError::LookupUnsuccessful)
        ));
        assert!(matches!(
            parse_candidates(b"<html>502</html>"),
            Err(PlaybackError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_missing_pieces_are_empty() {
        for body in [
            r#"{"success": true}"#,
            r#"{"success": true, "data": null}"#,
            r#"{"success": true, "data": {"results": []}}"#,
            r#"{"success": true, "data": {"results": [{}]}}"#,
            r#"{"success": true, "data": {"results": [{"downloadUrl": null}]}}"#,
        ] {
            assert!(parse_candidates(body.as_bytes()).unwrap().is_empty(), "{body}");
        }
    }
}
