//! # Audio Resolution
//!
//! Finds playable audio for a logical track (title, artist, album) and keeps
//! the host's media output supplied while candidates fail.
//!
//! ## Overview
//!
//! - [`query`]: search string variants derived from track metadata
//! - [`cache`]: durable query → candidate URL cache
//! - [`lookup`]: song search HTTP client
//! - [`session`]: per-selection candidate state
//! - [`engine`]: the orchestrator tying them together
//!
//! ## Example
//!
//! ```rust,ignore
//! use core_playback::AudioResolutionEngine;
//!
//! let engine = Arc::new(AudioResolutionEngine::from_config(
//!     &config,
//!     store.clone(),
//!     output,
//!     Some(bus.clone()),
//! ));
//! engine.clone().follow_track_changes(EventStream::new(bus.subscribe()));
//!
//! store.play_track(track).await?;
//! // audio element callbacks
//! engine.on_playback_error();
//! engine.on_playback_ready();
//! ```

pub mod cache;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod query;
pub mod session;

pub use cache::{AudioUrlCache, SettingsAudioCache};
pub use engine::{AudioResolutionEngine, ResolveOutcome};
pub use error::{PlaybackError, Result};
pub use lookup::{AudioLookup, SongSearchClient};
pub use query::{build_queries, ResolutionQuery};
pub use session::{ResolutionSession, ResolutionStatus};
