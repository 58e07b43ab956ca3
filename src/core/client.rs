//! Channel search client
//!
//! Cache-first channel listing with bounded key rotation. The full fetch
//! is two upstream calls: `search.list` for recent video ids, then
//! `videos.list` for the untruncated descriptions the extractor scans.

use crate::core::keys::KeyPool;
use crate::core::youtube::{ChannelSearchRequest, UpstreamError, YouTubeApi};
use crate::error::{BaseFinderError, Result};
use crate::storage::cache::VideoCache;
use crate::types::{ChannelId, VideoRecord};
use chrono::{Duration, Utc};
use std::sync::Arc;

/// Fetches recent videos for one channel at a time.
///
/// Shares the key pool and cache with every concurrent query; both guard
/// themselves internally and no lock is held across an await.
pub struct SearchClient {
    api: Arc<dyn YouTubeApi>,
    keys: Arc<KeyPool>,
    cache: Arc<VideoCache>,
    lookback_days: i64,
    max_videos: u32,
}

impl SearchClient {
    pub fn new(
        api: Arc<dyn YouTubeApi>,
        keys: Arc<KeyPool>,
        cache: Arc<VideoCache>,
        lookback_days: i64,
        max_videos: u32,
    ) -> Self {
        Self {
            api,
            keys,
            cache,
            lookback_days,
            max_videos,
        }
    }

    /// Returns the channel's recent videos, most-recent-first.
    ///
    /// The listing is a function of the channel alone, so a cached entry
    /// is valid for every query within the TTL and a fresh hit costs zero
    /// quota. On a miss the upstream fetch retries through the key pool: a
    /// quota-class failure marks the key exhausted and tries the next one,
    /// capped at pool size so the loop always terminates.
    pub async fn list_recent_videos(&self, channel: &ChannelId) -> Result<Vec<VideoRecord>> {
        if let Some(videos) = self.cache.get(&channel.id) {
            tracing::debug!(channel = channel.label(), "cache hit");
            return Ok(videos);
        }

        let request = ChannelSearchRequest {
            channel_id: channel.id.clone(),
            max_results: self.max_videos,
            published_after: Utc::now() - Duration::days(self.lookback_days),
        };

        let max_attempts = self.keys.len();
        for _ in 0..max_attempts {
            let key = match self.keys.current() {
                Ok(key) => key,
                Err(BaseFinderError::PoolExhausted) => break,
                Err(e) => return Err(e),
            };

            match self.fetch_with_key(&key.key, &request).await {
                Ok(videos) => {
                    self.cache.put(&channel.id, videos.clone());
                    tracing::debug!(
                        channel = channel.label(),
                        count = videos.len(),
                        "fetched channel listing"
                    );
                    return Ok(videos);
                }
                Err(UpstreamError::QuotaExceeded) => {
                    self.keys.report_exhausted(&key);
                }
                Err(e) => {
                    return Err(BaseFinderError::UpstreamUnavailable {
                        channel: channel.label().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(BaseFinderError::QuotaExhausted {
            channel: channel.label().to_string(),
        })
    }

    /// One full fetch attempt under a single credential
    async fn fetch_with_key(
        &self,
        api_key: &str,
        request: &ChannelSearchRequest,
    ) -> std::result::Result<Vec<VideoRecord>, UpstreamError> {
        let video_ids = self.api.search_channel(api_key, request).await?;
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.api.list_videos(api_key, &video_ids).await
    }
}
