//! basefinder library
//!
//! Quota-aware discovery of Clash of Clans base layout links in YouTube
//! video descriptions.

pub mod core;
pub mod error;
pub mod storage;
pub mod types;
