//! YouTube Data API v3 transport
//!
//! Wire types, error-body classification, and the `YouTubeApi` seam the
//! search client talks through. The HTTP implementation lives here; tests
//! substitute fakes.

use crate::types::VideoRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

const API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Error reasons the API uses for quota-class failures
const QUOTA_REASONS: [&str; 4] = [
    "quotaExceeded",
    "dailyLimitExceeded",
    "rateLimitExceeded",
    "userRateLimitExceeded",
];

/// Failure of one upstream call, before it is mapped onto the crate's
/// channel-level error taxonomy
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The credential's quota window is spent; rotate and retry
    #[error("quota exceeded")]
    QuotaExceeded,

    /// Non-quota API rejection (bad key, unknown channel, ...)
    #[error("API error {status} ({reason}): {message}")]
    Api {
        status: u16,
        reason: String,
        message: String,
    },

    /// Network-level failure or unparseable response
    #[error("transport error: {0}")]
    Transport(String),
}

/// Parameters for one channel listing call. Deliberately query-free: the
/// listing is cached per channel, so its content must not depend on what
/// the requesting user asked for.
#[derive(Debug, Clone)]
pub struct ChannelSearchRequest {
    pub channel_id: String,
    pub max_results: u32,
    pub published_after: DateTime<Utc>,
}

/// Upstream listing operations, keyed per call so the credential can
/// rotate between attempts
#[async_trait]
pub trait YouTubeApi: Send + Sync {
    /// `search.list`: most-recent-first video ids for a channel
    async fn search_channel(
        &self,
        api_key: &str,
        request: &ChannelSearchRequest,
    ) -> Result<Vec<String>, UpstreamError>;

    /// `videos.list`: full snippets (untruncated descriptions) for ids
    async fn list_videos(
        &self,
        api_key: &str,
        video_ids: &[String],
    ) -> Result<Vec<VideoRecord>, UpstreamError>;
}

// ============================================
// Wire Types
// ============================================

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: SearchResultId,
}

#[derive(Debug, Deserialize)]
struct SearchResultId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    published_at: DateTime<Utc>,
    #[serde(default)]
    channel_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorItem {
    #[serde(default)]
    reason: String,
}

/// Map a non-success response onto the upstream error taxonomy. Quota
/// exhaustion is identified from the structured error body's reason.
fn classify_api_error(status: u16, body: &str) -> UpstreamError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => {
            let reason = parsed
                .error
                .errors
                .first()
                .map(|e| e.reason.clone())
                .unwrap_or_default();
            if QUOTA_REASONS.contains(&reason.as_str()) {
                UpstreamError::QuotaExceeded
            } else {
                UpstreamError::Api {
                    status,
                    reason,
                    message: parsed.error.message,
                }
            }
        }
        Err(_) => UpstreamError::Api {
            status,
            reason: String::new(),
            message: body.chars().take(200).collect(),
        },
    }
}

// ============================================
// HTTP Implementation
// ============================================

/// Data API client over reqwest
pub struct YouTubeDataApi {
    client: reqwest::Client,
    base_url: String,
}

impl YouTubeDataApi {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: API_BASE_URL.to_string(),
        }
    }

    /// Override the endpoint base, e.g. to point at a local stub server
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, UpstreamError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_api_error(status.as_u16(), &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::Transport(format!("response parse failed: {}", e)))
    }
}

#[async_trait]
impl YouTubeApi for YouTubeDataApi {
    async fn search_channel(
        &self,
        api_key: &str,
        request: &ChannelSearchRequest,
    ) -> Result<Vec<String>, UpstreamError> {
        let max_results = request.max_results.to_string();
        // RFC 3339 without fractional seconds, as the API requires
        let published_after = request
            .published_after
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();

        let params = [
            ("part", "snippet"),
            ("channelId", request.channel_id.as_str()),
            ("type", "video"),
            ("order", "date"),
            ("maxResults", max_results.as_str()),
            ("publishedAfter", published_after.as_str()),
            ("key", api_key),
        ];

        let response: SearchListResponse = self.get_json("search", &params).await?;
        let ids = response
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect();
        Ok(ids)
    }

    async fn list_videos(
        &self,
        api_key: &str,
        video_ids: &[String],
    ) -> Result<Vec<VideoRecord>, UpstreamError> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = video_ids.join(",");
        let params = [("part", "snippet"), ("id", ids.as_str()), ("key", api_key)];

        let response: VideoListResponse = self.get_json("videos", &params).await?;
        let records = response
            .items
            .into_iter()
            .map(|item| VideoRecord {
                id: item.id,
                title: item.snippet.title,
                description: item.snippet.description,
                published_at: item.snippet.published_at,
                channel_id: item.snippet.channel_id,
            })
            .collect();
        Ok(records)
    }
}
