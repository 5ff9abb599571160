//! # Resolve a Track
//!
//! Looks up playable audio for a title/artist pair against the live search
//! service and walks the candidate list as if every source failed to load.
//!
//! Run with:
//! `cargo run --example resolve_track --package core-playback -- "Kesariya" "Arijit Singh" "Brahmastra"`

use bridge_traits::playback::MediaOutput;
use core_library::models::Track;
use core_library::store::{PlayerStore, TrackStore};
use core_playback::{AudioResolutionEngine, ResolveOutcome};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Console Media Output (for demonstration)
// ============================================================================

struct ConsoleOutput;

impl MediaOutput for ConsoleOutput {
    fn set_source(&self, url: &str) {
        println!("  ▶ source: {url}");
    }

    fn clear_source(&self) {
        println!("  ■ source cleared");
    }

    fn play(&self) {
        println!("  ▶ play");
    }

    fn pause(&self) {
        println!("  ‖ pause");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::default().with_format(LogFormat::Compact))?;

    let mut args = std::env::args().skip(1);
    let title = args.next().unwrap_or_else(|| "Kesariya".to_string());
    let artist = args.next().unwrap_or_else(|| "Arijit Singh".to_string());
    let mut track = Track::new("demo-1", title, artist);
    if let Some(album) = args.next() {
        track = track.with_album(album);
    }

    let db_path = std::env::temp_dir().join("sonic-resolve-demo.db");
    let config = CoreConfig::builder()
        .settings_db_path(&db_path)
        .lookup_timeout(Duration::from_secs(10))
        .build()?;

    let store = Arc::new(PlayerStore::new());
    let engine = AudioResolutionEngine::from_config(&config, store.clone(), Arc::new(ConsoleOutput), None);

    println!("Resolving \"{track}\" (cache at {})", db_path.display());
    store.play_track(track.clone()).await?;

    match engine.resolve(&track).await {
        ResolveOutcome::Ready { candidates, .. } => {
            println!("Found {} candidate(s)", candidates.len());
            engine.on_playback_ready();

            // Pretend every source fails to decode
            for _ in 0..candidates.len() {
                engine.on_playback_error();
            }
            println!("Last signal: {:?}", store.last_signal());
            println!("Intent after exhaustion: {:?}", store.playback_intent());
        }
        ResolveOutcome::Exhausted => println!("No audio found"),
        ResolveOutcome::Superseded => println!("Selection changed while resolving"),
    }

    Ok(())
}
