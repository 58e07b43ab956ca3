//! Type definitions for basefinder
//!
//! Source of truth for all data structures.

use crate::error::{BaseFinderError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Town Hall levels with layout-link support
pub const MIN_TH_LEVEL: u8 = 15;
pub const MAX_TH_LEVEL: u8 = 17;

// ============================================
// Query Types
// ============================================

/// Base category searched for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseType {
    War,
    Cwl,
    Legend,
}

impl BaseType {
    /// Keyword form used in video titles and descriptions
    pub fn keyword(&self) -> &'static str {
        match self {
            BaseType::War => "War",
            BaseType::Cwl => "CWL",
            BaseType::Legend => "Legend",
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for BaseType {
    type Err = BaseFinderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "war" => Ok(BaseType::War),
            "cwl" => Ok(BaseType::Cwl),
            "legend" => Ok(BaseType::Legend),
            other => Err(BaseFinderError::InvalidQuery(format!(
                "unknown base type '{}' (expected War, CWL, or Legend)",
                other
            ))),
        }
    }
}

/// One user request: Town Hall level plus base category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchQuery {
    th_level: u8,
    pub base_type: BaseType,
}

impl SearchQuery {
    /// Validates the Town Hall level range (15-17)
    pub fn new(th_level: u8, base_type: BaseType) -> Result<Self> {
        if !(MIN_TH_LEVEL..=MAX_TH_LEVEL).contains(&th_level) {
            return Err(BaseFinderError::InvalidQuery(format!(
                "Town Hall level {} out of range ({}-{})",
                th_level, MIN_TH_LEVEL, MAX_TH_LEVEL
            )));
        }
        Ok(Self { th_level, base_type })
    }

    pub fn th_level(&self) -> u8 {
        self.th_level
    }

    /// Town Hall token as it appears in titles, e.g. "TH16"
    pub fn th_token(&self) -> String {
        format!("TH{}", self.th_level)
    }
}

// ============================================
// Video Types
// ============================================

/// A channel from the curated list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelId {
    pub id: String,
    /// Display name, if the list provides one
    pub name: Option<String>,
}

impl ChannelId {
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// A video discovered in a channel listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub channel_id: String,
}

/// A validated layout link found in a video description
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutLink {
    pub url: String,
    /// Video the link was extracted from
    pub video_id: String,
}

impl LayoutLink {
    /// Percent-decoded layout id, e.g. "TH16:WAR:AAAA-BBBB"
    pub fn layout_id(&self) -> Option<String> {
        let encoded = self.url.split("id=").nth(1)?;
        urlencoding::decode(encoded).ok().map(|s| s.into_owned())
    }
}

// ============================================
// Cache Types
// ============================================

/// One channel's cached listing with its fetch timestamp
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub videos: Vec<VideoRecord>,
    pub fetched_at: DateTime<Utc>,
}

// ============================================
// Config Types
// ============================================

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Ordered API key pool (startup-fatal if empty)
    pub api_keys: Vec<String>,
    /// Path to the channel list file
    pub channels_file: String,
    /// Cache freshness window in seconds (default: 3600)
    pub cache_ttl_secs: u64,
    /// Max layout links returned per query (default: 5)
    pub max_links: usize,
    /// Only consider videos published within this many days (default: 4)
    pub lookback_days: i64,
    /// Videos requested per channel listing (default: 5)
    pub max_videos_per_channel: u32,
    /// Cache entries kept before oldest are evicted (default: 100)
    pub max_cache_entries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            channels_file: "channels.txt".into(),
            cache_ttl_secs: 3600,
            max_links: 5,
            lookback_days: 4,
            max_videos_per_channel: 5,
            max_cache_entries: 100,
        }
    }
}
