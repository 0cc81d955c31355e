//! Discovery run against the live services
//!
//! Run with:
//! ```bash
//! # Similar artists only (no Last.fm key: artist details and genres stay empty)
//! cargo run -p core-explore --features desktop-shims --example discover_demo -- "Radiohead" "Portishead"
//!
//! # With Last.fm enrichment
//! LASTFM_API_KEY=... cargo run -p core-explore --features desktop-shims --example discover_demo -- "Bjork"
//! ```

use bridge_traits::LogLevel;
use core_explore::{
    ExploreController, ExploreStore, InMemoryExploreStore, LibrarySelector, RunOutcome,
    SeedArtist,
};
use core_runtime::config::{ExploreApiConfig, ExploreConfig};
use core_runtime::events::{CoreEvent, EventBus, EventStream};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::env;
use std::sync::Arc;
use tracing::info;

struct DemoLibrary;

impl LibrarySelector for DemoLibrary {
    fn has_active_connection(&self) -> bool {
        true
    }

    fn known_genres(&self) -> Vec<String> {
        vec!["trip hop".to_string(), "shoegaze".to_string()]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )?;

    let seeds: Vec<SeedArtist> = env::args().skip(1).map(SeedArtist::new).collect();

    let mut api = ExploreApiConfig::default();
    if let Ok(key) = env::var("LASTFM_API_KEY") {
        api = api.with_lastfm_api_key(key);
    }
    let config = ExploreConfig::builder().api(api).build()?;

    let store = Arc::new(InMemoryExploreStore::new());
    let bus = EventBus::default();
    let mut events = EventStream::new(bus.subscribe())
        .filter(|event| matches!(event, CoreEvent::Explore(_)));
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            info!(event = event.description(), "Explore event");
        }
    });

    let controller = ExploreController::from_config(
        &config,
        Arc::clone(&store) as Arc<dyn ExploreStore>,
        Arc::new(DemoLibrary),
        Some(bus),
    )?;

    match controller.run(seeds).await {
        RunOutcome::Skipped(reason) => println!("Run skipped: {}", reason.as_str()),
        RunOutcome::Completed(summary) | RunOutcome::Cancelled(summary) => {
            println!("{:#?}", summary);
        }
    }

    let state = store.snapshot();
    for entry in &state.similar_artists {
        println!("{} ({} albums)", entry.artist.name, entry.albums.len());
    }
    for feed in &state.genre_feeds {
        println!("#{}: {} albums", feed.genre, feed.albums.len());
    }

    Ok(())
}
