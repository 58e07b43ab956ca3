//! Storage modules: config, cache, channel list

pub mod cache;
pub mod channels;
pub mod config;
