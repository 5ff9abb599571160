//! Domain models for the player
//!
//! Tracks arrive from catalog pages and recommendation feeds already shaped;
//! the core never edits them, it only reads their metadata to find audio.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Track
// =============================================================================

/// A logical track selected for playback.
///
/// Identity is `id`; the rest is display and search metadata. `duration_secs`
/// is the catalog duration and may be zero when unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    /// Raw artist credit, possibly listing several artists ("A, B & C feat. D")
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(rename = "duration", default)]
    pub duration_secs: f64,
    /// Used by the genre preference counter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            cover_url: None,
            duration_secs: 0.0,
            genre: None,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_cover_url(mut self, url: impl Into<String>) -> Self {
        self.cover_url = Some(url.into());
        self
    }

    pub fn with_duration_secs(mut self, secs: f64) -> Self {
        self.duration_secs = secs;
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    /// Validate track data
    ///
    /// An empty title is allowed: such a track simply resolves to no audio.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Track id cannot be empty".to_string());
        }

        if !self.duration_secs.is_finite() || self.duration_secs < 0.0 {
            return Err(format!(
                "Track duration must be a non-negative number, got {}",
                self.duration_secs
            ));
        }

        Ok(())
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.artist)
    }
}

// =============================================================================
// Playback state
// =============================================================================

/// What the user wants the player to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackIntent {
    Playing,
    #[default]
    Paused,
}

impl PlaybackIntent {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackIntent::Playing)
    }

    pub fn toggled(&self) -> Self {
        match self {
            PlaybackIntent::Playing => PlaybackIntent::Paused,
            PlaybackIntent::Paused => PlaybackIntent::Playing,
        }
    }
}

/// Terminal resolution outcomes reported back to the track store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum StoreSignal {
    /// No query variant produced a candidate URL.
    NoAudioFound { track_id: String },
    /// Every candidate URL failed in the media output.
    PlaybackStalled { track_id: String },
}

impl StoreSignal {
    pub fn track_id(&self) -> &str {
        match self {
            StoreSignal::NoAudioFound { track_id } | StoreSignal::PlaybackStalled { track_id } => {
                track_id
            }
        }
    }
}
