//! Per-channel video listing cache
//!
//! In-memory with a freshness window. A fresh hit costs zero upstream
//! quota; a stale entry is treated as a miss, never served.

use crate::types::{CacheEntry, VideoRecord};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Shared video cache keyed by channel id.
///
/// Operations never fail; a miss simply means the caller fetches upstream.
pub struct VideoCache {
    ttl: Duration,
    max_entries: usize,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl VideoCache {
    pub fn new(ttl_secs: u64, max_entries: usize) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs as i64),
            max_entries,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached listing if the entry is still fresh.
    /// Stale entries are evicted on the spot.
    pub fn get(&self, channel_id: &str) -> Option<Vec<VideoRecord>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(channel_id) {
            Some(entry) if Utc::now() - entry.fetched_at < self.ttl => {
                Some(entry.videos.clone())
            }
            Some(_) => {
                entries.remove(channel_id);
                None
            }
            None => None,
        }
    }

    /// Replaces the channel's entry with a now-stamped listing
    pub fn put(&self, channel_id: &str, videos: Vec<VideoRecord>) {
        self.put_at(channel_id, videos, Utc::now());
    }

    fn put_at(&self, channel_id: &str, videos: Vec<VideoRecord>, fetched_at: DateTime<Utc>) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            channel_id.to_string(),
            CacheEntry { videos, fetched_at },
        );

        // Evict oldest entries past capacity
        while entries.len() > self.max_entries {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.fetched_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}
