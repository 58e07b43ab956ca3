//! Core modules: key pool, upstream transport, search client, extraction, query engine

pub mod client;
pub mod engine;
pub mod extractor;
pub mod keys;
pub mod youtube;
