//! # Library Module
//!
//! Owns the player-side state the audio resolution engine collaborates with.
//!
//! ## Overview
//!
//! This module provides:
//! - The [`Track`] model and [`PlaybackIntent`]
//! - The [`TrackStore`] contract and the in-memory [`PlayerStore`]
//! - A genre preference counter persisted through the settings bridge
//! - Listen tracking and reporting to the tracking backend

pub mod error;
pub mod listens;
pub mod models;
pub mod preferences;
pub mod store;

pub use error::{LibraryError, Result};
pub use listens::{FinishedListen, ListenReport, ListenReporter, ListenTracker};
pub use models::{PlaybackIntent, StoreSignal, Track};
pub use preferences::GenrePreferences;
pub use store::{PlayerStore, TrackStore};
