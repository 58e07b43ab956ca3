//! Query engine: channel fan-out, filtering, aggregation

use crate::core::client::SearchClient;
use crate::core::extractor::extract_links;
use crate::types::{ChannelId, LayoutLink, SearchQuery, VideoRecord};

/// Orchestrates one user query across the configured channel list.
///
/// Channels are visited sequentially in list order, so the result order is
/// a pure function of the channel list and the video data: channel order
/// first, recency order within a channel. Scanning stops at the cap, which
/// cannot change the result prefix and saves quota.
pub struct QueryEngine {
    client: SearchClient,
    channels: Vec<ChannelId>,
    max_links: usize,
}

impl QueryEngine {
    pub fn new(client: SearchClient, channels: Vec<ChannelId>, max_links: usize) -> Self {
        Self {
            client,
            channels,
            max_links,
        }
    }

    /// Finds up to `max_links` layout links for the query.
    ///
    /// Per-channel failures (quota, transport) are logged and skipped so a
    /// bad channel or spent key never aborts the whole query. Returns an
    /// empty Vec when nothing matched; never an error.
    pub async fn find_bases(&self, query: &SearchQuery) -> Vec<LayoutLink> {
        let mut links: Vec<LayoutLink> = Vec::new();

        for channel in &self.channels {
            if links.len() >= self.max_links {
                break;
            }

            let videos = match self.client.list_recent_videos(channel).await {
                Ok(videos) => videos,
                Err(e) if e.is_channel_skip() => {
                    tracing::warn!(channel = channel.label(), "skipping channel: {}", e);
                    continue;
                }
                Err(e) => {
                    tracing::error!(channel = channel.label(), "unexpected error: {}", e);
                    continue;
                }
            };

            for video in &videos {
                if links.len() >= self.max_links {
                    break;
                }
                if !matches_query(video, query) {
                    continue;
                }
                for link in extract_links(video, query.th_level()) {
                    if links.len() >= self.max_links {
                        break;
                    }
                    // Same layout may be posted in several videos
                    if links.iter().any(|l| l.url == link.url) {
                        continue;
                    }
                    links.push(link);
                }
            }
        }

        tracing::info!(
            th = query.th_token(),
            base_type = %query.base_type,
            found = links.len(),
            "query complete"
        );
        links
    }
}

/// Keyword filter for candidate videos: the Town Hall token and the
/// base-type keyword must both appear in the title or description,
/// case-insensitive, as independent substrings. Containment matching is
/// deliberately fuzzy; the upstream relevance query already narrowed the
/// candidates and false positives still need a valid layout link to
/// surface.
pub fn matches_query(video: &VideoRecord, query: &SearchQuery) -> bool {
    let haystack = format!("{}\n{}", video.title, video.description).to_lowercase();
    haystack.contains(&query.th_token().to_lowercase())
        && haystack.contains(&query.base_type.keyword().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::keys::KeyPool;
    use crate::core::youtube::{ChannelSearchRequest, UpstreamError, YouTubeApi};
    use crate::storage::cache::VideoCache;
    use crate::types::BaseType;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;

    const LINK_A: &str =
        "https://link.clashofclans.com/en/?action=OpenLayout&id=TH16%3AWB%3AAAAA1111";
    const LINK_B: &str =
        "https://link.clashofclans.com/en/?action=OpenLayout&id=TH16%3AWB%3ABBBB2222";
    const LINK_17: &str =
        "https://link.clashofclans.com/en/?action=OpenLayout&id=TH17%3AWB%3ACCCC3333";

    fn video(id: &str, channel: &str, title: &str, description: &str) -> VideoRecord {
        VideoRecord {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            published_at: Utc::now(),
            channel_id: channel.into(),
        }
    }

    /// Per-channel canned listings; quota keys fail until rotated past
    struct FakeApi {
        exhausted_keys: HashSet<String>,
        by_channel: HashMap<String, Vec<VideoRecord>>,
        calls: std::sync::Mutex<usize>,
    }

    impl FakeApi {
        fn new(
            exhausted_keys: HashSet<String>,
            by_channel: HashMap<String, Vec<VideoRecord>>,
        ) -> Self {
            Self {
                exhausted_keys,
                by_channel,
                calls: std::sync::Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl YouTubeApi for FakeApi {
        async fn search_channel(
            &self,
            api_key: &str,
            request: &ChannelSearchRequest,
        ) -> Result<Vec<String>, UpstreamError> {
            *self.calls.lock().unwrap() += 1;
            if self.exhausted_keys.contains(api_key) {
                return Err(UpstreamError::QuotaExceeded);
            }
            Ok(self
                .by_channel
                .get(&request.channel_id)
                .map(|vs| vs.iter().map(|v| v.id.clone()).collect())
                .unwrap_or_default())
        }

        async fn list_videos(
            &self,
            api_key: &str,
            video_ids: &[String],
        ) -> Result<Vec<VideoRecord>, UpstreamError> {
            *self.calls.lock().unwrap() += 1;
            if self.exhausted_keys.contains(api_key) {
                return Err(UpstreamError::QuotaExceeded);
            }
            Ok(self
                .by_channel
                .values()
                .flatten()
                .filter(|v| video_ids.contains(&v.id))
                .cloned()
                .collect())
        }
    }

    fn channel(id: &str) -> ChannelId {
        ChannelId {
            id: id.into(),
            name: None,
        }
    }

    fn engine(
        api: Arc<FakeApi>,
        keys: &[&str],
        cache: Arc<VideoCache>,
        channels: Vec<ChannelId>,
        max_links: usize,
    ) -> QueryEngine {
        let pool = Arc::new(KeyPool::new(keys.iter().map(|k| k.to_string()).collect()).unwrap());
        let client = SearchClient::new(api, pool, cache, 4, 5);
        QueryEngine::new(client, channels, max_links)
    }

    fn query() -> SearchQuery {
        SearchQuery::new(16, BaseType::War).unwrap()
    }

    #[test]
    fn test_filter_requires_both_tokens() {
        let q = query();
        assert!(matches_query(
            &video("v", "c", "BEST TH16 WAR BASE 2025", ""),
            &q
        ));
        assert!(matches_query(
            &video("v", "c", "New layout", "th16 anti 3 star war base"),
            &q
        ));
        assert!(!matches_query(&video("v", "c", "TH16 Farm Base", ""), &q));
        assert!(!matches_query(&video("v", "c", "TH15 War Base", ""), &q));
    }

    #[tokio::test]
    async fn test_cache_hit_first_then_rotated_fetch() {
        // Channel A is fresh in cache; channel B misses and the first key
        // is quota-exhausted, so its fetch succeeds on the second key.
        let cache = Arc::new(VideoCache::new(3600, 100));
        cache.put(
            "chan-a",
            vec![video("va", "chan-a", "TH16 War Base", &format!("copy: {}", LINK_A))],
        );

        let api = Arc::new(FakeApi::new(
            ["k1".to_string()].into(),
            HashMap::from([(
                "chan-b".to_string(),
                vec![video("vb", "chan-b", "TH16 War Base", &format!("copy: {}", LINK_B))],
            )]),
        ));

        let e = engine(
            api,
            &["k1", "k2"],
            cache,
            vec![channel("chan-a"), channel("chan-b")],
            5,
        );
        let links = e.find_bases(&query()).await;

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, LINK_A);
        assert_eq!(links[1].url, LINK_B);
    }

    #[tokio::test]
    async fn test_cached_listing_serves_other_queries() {
        // One channel holds both a TH16 War and a TH17 War video. The
        // listing cached by the first query must satisfy a different query
        // within the TTL without another upstream fetch.
        let api = Arc::new(FakeApi::new(
            HashSet::new(),
            HashMap::from([(
                "chan-a".to_string(),
                vec![
                    video("v16", "chan-a", "TH16 War Base", &format!("copy: {}", LINK_A)),
                    video("v17", "chan-a", "TH17 War Base", &format!("copy: {}", LINK_17)),
                ],
            )]),
        ));
        let cache = Arc::new(VideoCache::new(3600, 100));

        let e = engine(api.clone(), &["k1"], cache, vec![channel("chan-a")], 5);

        let first = e.find_bases(&query()).await;
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].url, LINK_A);
        let calls_after_first = api.call_count();

        let second = e
            .find_bases(&SearchQuery::new(17, BaseType::War).unwrap())
            .await;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].url, LINK_17);
        assert_eq!(api.call_count(), calls_after_first);
    }

    #[tokio::test]
    async fn test_total_exhaustion_returns_empty_not_error() {
        let api = Arc::new(FakeApi::new(
            ["k1".to_string(), "k2".to_string()].into(),
            HashMap::new(),
        ));
        let cache = Arc::new(VideoCache::new(3600, 100));

        let e = engine(
            api,
            &["k1", "k2"],
            cache,
            vec![channel("chan-a"), channel("chan-b")],
            5,
        );
        assert!(e.find_bases(&query()).await.is_empty());
    }

    #[tokio::test]
    async fn test_results_never_exceed_cap() {
        let links: String = (0..10)
            .map(|i| {
                format!(
                    "https://link.clashofclans.com/en/?action=OpenLayout&id=TH16%3AWB%3ALINK{:04}\n",
                    i
                )
            })
            .collect();
        let api = Arc::new(FakeApi::new(
            HashSet::new(),
            HashMap::from([(
                "chan-a".to_string(),
                vec![video("va", "chan-a", "TH16 War Base pack", &links)],
            )]),
        ));
        let cache = Arc::new(VideoCache::new(3600, 100));

        let e = engine(api, &["k1"], cache, vec![channel("chan-a")], 3);
        assert_eq!(e.find_bases(&query()).await.len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_link_across_videos_collapses() {
        let api = Arc::new(FakeApi::new(
            HashSet::new(),
            HashMap::from([(
                "chan-a".to_string(),
                vec![
                    video("v1", "chan-a", "TH16 War Base", &format!("copy: {}", LINK_A)),
                    video("v2", "chan-a", "TH16 War Base rerun", &format!("still: {}", LINK_A)),
                ],
            )]),
        ));
        let cache = Arc::new(VideoCache::new(3600, 100));

        let e = engine(api, &["k1"], cache, vec![channel("chan-a")], 5);
        assert_eq!(e.find_bases(&query()).await.len(), 1);
    }

    #[tokio::test]
    async fn test_non_matching_videos_yield_no_links() {
        let api = Arc::new(FakeApi::new(
            HashSet::new(),
            HashMap::from([(
                "chan-a".to_string(),
                vec![video("v1", "chan-a", "TH16 Farm Base", &format!("copy: {}", LINK_A))],
            )]),
        ));
        let cache = Arc::new(VideoCache::new(3600, 100));

        let e = engine(api, &["k1"], cache, vec![channel("chan-a")], 5);
        assert!(e.find_bases(&query()).await.is_empty());
    }
}
