//! Track store
//!
//! [`TrackStore`] is the contract the resolution engine reads live selection
//! state from and reports outcomes to. [`PlayerStore`] is the in-memory
//! implementation: current track, play/pause intent, queue, volume and
//! progress.

use crate::error::{LibraryError, Result};
use crate::models::{PlaybackIntent, StoreSignal, Track};
use crate::preferences::GenrePreferences;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Live selection and playback state consulted by the resolution engine.
///
/// Methods are synchronous and cheap; implementations must not call back
/// into the engine from inside them.
pub trait TrackStore: Send + Sync {
    /// The currently selected track, if any.
    fn current_track(&self) -> Option<Track>;

    /// Whether `track_id` is still the current selection.
    fn is_current(&self, track_id: &str) -> bool {
        self.current_track()
            .map_or(false, |track| track.id == track_id)
    }

    fn playback_intent(&self) -> PlaybackIntent;

    /// Fraction of the current track played, `0.0..=1.0`.
    fn set_progress(&self, progress: f64);

    /// Playback position of the current track in seconds.
    fn set_current_time(&self, secs: f64);

    /// No audio could be found for `track_id`.
    fn signal_no_audio(&self, track_id: &str);

    /// Every candidate for `track_id` failed; playback should stop.
    fn signal_playback_stalled(&self, track_id: &str);

    /// Advance to the next queued track.
    fn next_track(&self);
}

#[derive(Debug, Clone)]
struct PlayerState {
    current: Option<Track>,
    intent: PlaybackIntent,
    queue: Vec<Track>,
    volume: f32,
    progress: f64,
    current_time: f64,
    last_signal: Option<StoreSignal>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            current: None,
            intent: PlaybackIntent::Paused,
            queue: Vec::new(),
            volume: DEFAULT_VOLUME,
            progress: 0.0,
            current_time: 0.0,
            last_signal: None,
        }
    }
}

pub const DEFAULT_VOLUME: f32 = 0.7;

/// In-memory player state.
///
/// State changes are published as [`PlaybackEvent`]s when an [`EventBus`] is
/// attached; a [`GenrePreferences`] tracker, when attached, is bumped on every
/// [`play_track`](PlayerStore::play_track).
#[derive(Default)]
pub struct PlayerStore {
    state: RwLock<PlayerState>,
    events: Option<EventBus>,
    preferences: Option<Arc<GenrePreferences>>,
}

impl PlayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue(mut self, queue: Vec<Track>) -> Self {
        self.state.get_mut().queue = queue;
        self
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_preferences(mut self, preferences: Arc<GenrePreferences>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(events) = &self.events {
            // No subscribers is not an error for the store
            let _ = events.emit(CoreEvent::Playback(event));
        }
    }

    fn emit_intent(&self, track_id: String, intent: PlaybackIntent) {
        self.emit(match intent {
            PlaybackIntent::Playing => PlaybackEvent::Started { track_id },
            PlaybackIntent::Paused => PlaybackEvent::Paused { track_id },
        });
    }

    /// Select `track` and set the intent to playing.
    ///
    /// Progress and any previous resolution signal are reset, unless `track`
    /// is already the current selection.
    pub async fn play_track(&self, track: Track) -> Result<()> {
        track
            .validate()
            .map_err(|message| LibraryError::InvalidInput {
                field: "track".to_string(),
                message,
            })?;

        let genre = track.genre.clone();
        self.select(track, PlaybackIntent::Playing);

        if let (Some(preferences), Some(genre)) = (&self.preferences, genre) {
            if let Err(e) = preferences.record_interaction(&genre).await {
                warn!(genre = %genre, error = %e, "Failed to record genre interaction");
            }
        }

        Ok(())
    }

    /// Re-selecting the current track only applies `intent`; the selection,
    /// its progress and signals are left alone and no `TrackChanged` fires.
    fn select(&self, track: Track, intent: PlaybackIntent) {
        let track_id = track.id.clone();
        let title = track.title.clone();
        {
            let mut state = self.state.write();
            if state.current.as_ref().is_some_and(|current| current.id == track_id) {
                drop(state);
                debug!(track_id = %track_id, "Current track re-selected");
                self.set_intent(intent);
                return;
            }
            state.current = Some(track);
            state.intent = intent;
            state.progress = 0.0;
            state.current_time = 0.0;
            state.last_signal = None;
        }

        info!(track_id = %track_id, title = %title, "Track selected");
        self.emit(PlaybackEvent::TrackChanged {
            track_id: track_id.clone(),
            title,
        });
        self.emit_intent(track_id, intent);
    }

    fn set_intent(&self, intent: PlaybackIntent) {
        let track_id = {
            let mut state = self.state.write();
            if state.intent == intent {
                return;
            }
            state.intent = intent;
            state.current.as_ref().map(|track| track.id.clone())
        };

        if let Some(track_id) = track_id {
            self.emit_intent(track_id, intent);
        }
    }

    pub fn toggle_play(&self) {
        let next = self.state.read().intent.toggled();
        self.set_intent(next);
    }

    pub fn pause(&self) {
        self.set_intent(PlaybackIntent::Paused);
    }

    pub fn resume(&self) {
        self.set_intent(PlaybackIntent::Playing);
    }

    /// Step back one place in the queue. No-op at the head or off-queue.
    pub fn prev_track(&self) {
        let previous = {
            let state = self.state.read();
            let Some(current) = &state.current else {
                return;
            };
            match state.queue.iter().position(|t| t.id == current.id) {
                Some(idx) if idx > 0 => state.queue[idx - 1].clone(),
                _ => return,
            }
        };

        self.select(previous, PlaybackIntent::Playing);
    }

    pub fn add_to_queue(&self, track: Track) {
        debug!(track_id = %track.id, "Queued track");
        self.state.write().queue.push(track);
    }

    /// Volume is clamped to `0.0..=1.0`.
    pub fn set_volume(&self, volume: f32) {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.state.write().volume = volume;
    }

    pub fn volume(&self) -> f32 {
        self.state.read().volume
    }

    pub fn progress(&self) -> f64 {
        self.state.read().progress
    }

    pub fn current_time(&self) -> f64 {
        self.state.read().current_time
    }

    pub fn queue(&self) -> Vec<Track> {
        self.state.read().queue.clone()
    }

    /// The most recent resolution signal for the current selection.
    pub fn last_signal(&self) -> Option<StoreSignal> {
        self.state.read().last_signal.clone()
    }
}

impl TrackStore for PlayerStore {
    fn current_track(&self) -> Option<Track> {
        self.state.read().current.clone()
    }

    fn is_current(&self, track_id: &str) -> bool {
        self.state
            .read()
            .current
            .as_ref()
            .map_or(false, |track| track.id == track_id)
    }

    fn playback_intent(&self) -> PlaybackIntent {
        self.state.read().intent
    }

    fn set_progress(&self, progress: f64) {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.state.write().progress = progress;
    }

    fn set_current_time(&self, secs: f64) {
        self.state.write().current_time = secs.max(0.0);
    }

    fn signal_no_audio(&self, track_id: &str) {
        let mut state = self.state.write();
        // Stale signals for an older selection are dropped
        if state.current.as_ref().map_or(true, |t| t.id != track_id) {
            return;
        }
        state.last_signal = Some(StoreSignal::NoAudioFound {
            track_id: track_id.to_string(),
        });
    }

    fn signal_playback_stalled(&self, track_id: &str) {
        {
            let mut state = self.state.write();
            if state.current.as_ref().map_or(true, |t| t.id != track_id) {
                return;
            }
            state.last_signal = Some(StoreSignal::PlaybackStalled {
                track_id: track_id.to_string(),
            });
        }
        self.set_intent(PlaybackIntent::Paused);
    }

    /// Advance through the queue; at the end, pause and rewind progress.
    ///
    /// A current track that is not in the queue advances to the queue head.
    fn next_track(&self) {
        let (next, finished) = {
            let mut state = self.state.write();
            let Some(current_id) = state.current.as_ref().map(|t| t.id.clone()) else {
                return;
            };

            let next_idx = state
                .queue
                .iter()
                .position(|t| t.id == current_id)
                .map_or(0, |idx| idx + 1);

            match state.queue.get(next_idx).cloned() {
                Some(track) => (Some(track), None),
                None => {
                    state.progress = 0.0;
                    (None, Some(current_id))
                }
            }
        };

        if let Some(track) = next {
            self.select(track, PlaybackIntent::Playing);
        } else if let Some(track_id) = finished {
            debug!(track_id = %track_id, "Reached end of queue");
            self.emit(PlaybackEvent::Completed { track_id });
            self.set_intent(PlaybackIntent::Paused);
        }
    }
}
