//! basefinder - find fresh Clash of Clans base layouts on YouTube
//!
//! Searches a curated channel list for recent videos matching a Town Hall
//! level and base category, and prints the layout links found in their
//! descriptions.

use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use basefinder::core::client::SearchClient;
use basefinder::core::engine::QueryEngine;
use basefinder::core::keys::KeyPool;
use basefinder::core::youtube::YouTubeDataApi;
use basefinder::storage::cache::VideoCache;
use basefinder::storage::channels::load_channels;
use basefinder::storage::config::load_config;
use basefinder::types::{BaseType, SearchQuery};

/// Find fresh Clash of Clans base layout links on YouTube
#[derive(Parser, Debug)]
#[command(name = "basefinder")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Town Hall level (15-17)
    #[arg(short, long)]
    level: u8,

    /// Base type: War, CWL, or Legend
    #[arg(short = 't', long = "type")]
    base_type: BaseType,

    /// Override the channel list file
    #[arg(long)]
    channels_file: Option<String>,

    /// Override the result cap
    #[arg(long)]
    max_links: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let mut config = load_config()?;
    if let Some(path) = cli.channels_file {
        config.channels_file = path;
    }
    if let Some(cap) = cli.max_links {
        config.max_links = cap;
    }

    let channels = load_channels(&config.channels_file).await?;
    anyhow::ensure!(
        !channels.is_empty(),
        "channel list {} is empty",
        config.channels_file
    );

    let query = SearchQuery::new(cli.level, cli.base_type)?;

    let keys = Arc::new(KeyPool::new(config.api_keys.clone())?);
    let _reset_task = KeyPool::spawn_daily_reset(keys.clone());

    let cache = Arc::new(VideoCache::new(
        config.cache_ttl_secs,
        config.max_cache_entries,
    ));
    let api = Arc::new(YouTubeDataApi::new(reqwest::Client::new()));
    let client = SearchClient::new(
        api,
        keys,
        cache,
        config.lookback_days,
        config.max_videos_per_channel,
    );
    let engine = QueryEngine::new(client, channels, config.max_links);

    println!(
        "{}",
        format!("Searching for {} {} bases...", query.th_token(), query.base_type).dimmed()
    );

    let links = engine.find_bases(&query).await;

    if links.is_empty() {
        println!(
            "{}",
            format!(
                "No {} {} bases found in the last {} days. Try again later.",
                query.th_token(),
                query.base_type,
                config.lookback_days
            )
            .yellow()
        );
        return Ok(());
    }

    for link in &links {
        match link.layout_id() {
            Some(id) => println!("{} {}", id.green(), link.url),
            None => println!("{}", link.url),
        }
    }

    Ok(())
}
