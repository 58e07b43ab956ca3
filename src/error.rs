//! Error types for basefinder

use thiserror::Error;

/// Main error type for basefinder
#[derive(Error, Debug)]
pub enum BaseFinderError {
    /// Every API key in the pool is marked quota-exhausted.
    #[error("all API keys are quota-exhausted")]
    PoolExhausted,

    /// A single channel fetch ran out of usable keys mid-flight.
    #[error("quota exhausted while fetching channel {channel}")]
    QuotaExhausted { channel: String },

    /// Transport, auth, or other non-quota upstream failure.
    #[error("upstream unavailable for channel {channel}: {reason}")]
    UpstreamUnavailable { channel: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),
}

impl BaseFinderError {
    /// True for failures that skip one channel but let the query continue.
    pub fn is_channel_skip(&self) -> bool {
        matches!(
            self,
            Self::QuotaExhausted { .. } | Self::UpstreamUnavailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BaseFinderError>;
