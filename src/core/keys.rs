//! API key pool with quota-exhaustion rotation
//!
//! Exhaustion is reactive: the upstream quota error is the only signal,
//! so credentials carry a binary exhausted flag, not call counts.

use crate::error::{BaseFinderError, Result};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Upstream quota windows reset daily
const RESET_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Handle to one pool slot, passed back on exhaustion reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub index: usize,
    pub key: String,
}

#[derive(Debug)]
struct Credential {
    key: String,
    exhausted: bool,
    exhausted_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct PoolState {
    credentials: Vec<Credential>,
    cursor: usize,
}

impl PoolState {
    /// First non-exhausted slot at or after `from`, wrapping around
    fn next_usable(&self, from: usize) -> Option<usize> {
        let n = self.credentials.len();
        (0..n)
            .map(|offset| (from + offset) % n)
            .find(|&i| !self.credentials[i].exhausted)
    }
}

/// Shared pool of upstream API keys.
///
/// Lock scope is a few field reads and writes; no caller holds it across
/// a network await.
pub struct KeyPool {
    state: Mutex<PoolState>,
}

impl KeyPool {
    /// An empty key list is a startup configuration error, not a runtime one
    pub fn new(keys: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            return Err(BaseFinderError::Config("no API keys configured".into()));
        }
        let credentials = keys
            .into_iter()
            .map(|key| Credential {
                key,
                exhausted: false,
                exhausted_at: None,
            })
            .collect();
        Ok(Self {
            state: Mutex::new(PoolState {
                credentials,
                cursor: 0,
            }),
        })
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the active key, advancing past exhausted slots if needed
    pub fn current(&self) -> Result<ApiKey> {
        let mut state = self.state.lock().unwrap();
        let cursor = state.cursor;
        match state.next_usable(cursor) {
            Some(index) => {
                state.cursor = index;
                Ok(ApiKey {
                    index,
                    key: state.credentials[index].key.clone(),
                })
            }
            None => Err(BaseFinderError::PoolExhausted),
        }
    }

    /// Marks a key exhausted and moves the cursor to the next usable slot.
    /// Reporting an already-exhausted key is a no-op.
    pub fn report_exhausted(&self, key: &ApiKey) {
        let mut state = self.state.lock().unwrap();
        let cred = &mut state.credentials[key.index];
        if cred.exhausted {
            return;
        }
        cred.exhausted = true;
        cred.exhausted_at = Some(Utc::now());
        tracing::warn!(key_index = key.index, "API key quota exhausted, rotating");

        let cursor = state.cursor;
        if let Some(next) = state.next_usable(cursor) {
            state.cursor = next;
        } else {
            tracing::error!("all API keys exhausted");
        }
    }

    /// Clears every exhaustion flag (scheduled daily quota reset)
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        let had_exhausted = state.credentials.iter().any(|c| c.exhausted);
        for cred in &mut state.credentials {
            cred.exhausted = false;
            cred.exhausted_at = None;
        }
        if had_exhausted {
            tracing::info!("API key pool reset, all keys usable again");
        }
    }

    /// Spawns a background task that resets the pool every 24 hours
    pub fn spawn_daily_reset(pool: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RESET_INTERVAL);
            // First tick fires immediately; skip it
            interval.tick().await;
            loop {
                interval.tick().await;
                pool.reset();
            }
        })
    }
}
