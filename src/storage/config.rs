//! Configuration loading from environment
//!
//! Reads `.env` when present, then the process environment. Missing API
//! keys are fatal at startup; every tunable has a default.

use crate::error::{BaseFinderError, Result};
use crate::types::Config;
use std::env;

/// Load configuration, merging environment over defaults
pub fn load_config() -> Result<Config> {
    // Best-effort; absence of a .env file is fine
    let _ = dotenv::dotenv();

    let api_keys = parse_api_keys(&env::var("API_KEYS").unwrap_or_default())?;

    let defaults = Config::default();
    let config = Config {
        api_keys,
        channels_file: env::var("CHANNELS_FILE").unwrap_or(defaults.channels_file),
        cache_ttl_secs: env_or("CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
        max_links: env_or("MAX_LINKS", defaults.max_links)?,
        lookback_days: env_or("LOOKBACK_DAYS", defaults.lookback_days)?,
        max_videos_per_channel: env_or("MAX_VIDEOS_PER_CHANNEL", defaults.max_videos_per_channel)?,
        max_cache_entries: env_or("MAX_CACHE_ENTRIES", defaults.max_cache_entries)?,
    };

    tracing::info!(keys = config.api_keys.len(), "configuration loaded");
    Ok(config)
}

/// Split the comma-separated key list, dropping empty segments.
/// No usable keys is a fatal configuration error.
pub fn parse_api_keys(raw: &str) -> Result<Vec<String>> {
    let keys: Vec<String> = raw
        .split(',')
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();

    if keys.is_empty() {
        return Err(BaseFinderError::Config(
            "API_KEYS is not set or contains no valid keys".into(),
        ));
    }
    Ok(keys)
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| BaseFinderError::Config(format!("invalid value for {}: {}", name, raw))),
        Err(_) => Ok(default),
    }
}
