//! # Audio Resolution Engine
//!
//! Turns the selected [`Track`] into a playable URL and keeps the media
//! output fed while candidates fail.
//!
//! ## Resolution
//!
//! [`resolve`](AudioResolutionEngine::resolve) walks the query variants in
//! order, consulting the cache before the remote lookup, and stops at the
//! first non-empty candidate list. Results are only applied if the track is
//! still the store's current selection when they arrive; otherwise they are
//! dropped, so the last selected track always wins.
//!
//! ## Fallback
//!
//! The host wires its audio element's callbacks to
//! [`on_playback_error`](AudioResolutionEngine::on_playback_error) and
//! [`on_playback_ready`](AudioResolutionEngine::on_playback_ready). Each
//! error moves to the next candidate; after the last one the store is told
//! playback stalled.

use crate::cache::{AudioUrlCache, SettingsAudioCache};
use crate::lookup::{AudioLookup, SongSearchClient};
use crate::query::build_queries;
use crate::session::{Fallback, ResolutionSession};
use bridge_traits::playback::MediaOutput;
use core_library::listens::{FinishedListen, ListenReporter, ListenTracker};
use core_library::models::Track;
use core_library::store::TrackStore;
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, EventStream, PlaybackEvent, RecvError};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Result of one [`resolve`](AudioResolutionEngine::resolve) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// `url` was handed to the media output; `candidates` are the fallbacks
    /// in order, `url` first.
    Ready { url: String, candidates: Vec<String> },
    /// No query variant produced a candidate.
    Exhausted,
    /// The selection changed while resolving; nothing was applied.
    Superseded,
}

struct ListenReporting {
    reporter: Arc<ListenReporter>,
    user_id: String,
}

pub struct AudioResolutionEngine {
    store: Arc<dyn TrackStore>,
    output: Arc<dyn MediaOutput>,
    cache: Arc<dyn AudioUrlCache>,
    lookup: Arc<dyn AudioLookup>,
    // Never held across an await or a collaborator call
    session: Mutex<ResolutionSession>,
    events: Option<EventBus>,
    listens: Option<ListenReporting>,
    tracker: ListenTracker,
}

impl AudioResolutionEngine {
    pub fn new(
        store: Arc<dyn TrackStore>,
        output: Arc<dyn MediaOutput>,
        cache: Arc<dyn AudioUrlCache>,
        lookup: Arc<dyn AudioLookup>,
    ) -> Self {
        Self {
            store,
            output,
            cache,
            lookup,
            session: Mutex::new(ResolutionSession::idle()),
            events: None,
            listens: None,
            tracker: ListenTracker::new(),
        }
    }

    /// Engine backed by the configured settings cache and search endpoint.
    ///
    /// When `events` is given, both the engine and its cache publish on it.
    pub fn from_config(
        config: &CoreConfig,
        store: Arc<dyn TrackStore>,
        output: Arc<dyn MediaOutput>,
        events: Option<EventBus>,
    ) -> Self {
        let mut cache = SettingsAudioCache::from_config(config);
        if let Some(bus) = &events {
            cache = cache.with_event_bus(bus.clone());
        }
        let lookup = SongSearchClient::from_config(config);

        let mut engine = Self::new(store, output, Arc::new(cache), Arc::new(lookup));
        engine.events = events;
        engine
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Report listens for `user_id` whenever the selection moves on.
    pub fn with_listen_reporter(
        mut self,
        reporter: ListenReporter,
        user_id: impl Into<String>,
    ) -> Self {
        self.listens = Some(ListenReporting {
            reporter: Arc::new(reporter),
            user_id: user_id.into(),
        });
        self
    }

    /// Snapshot of the active session.
    pub fn session(&self) -> ResolutionSession {
        self.session.lock().clone()
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(events) = &self.events {
            let _ = events.emit(CoreEvent::Playback(event));
        }
    }

    /// Resolve audio for `track` and hand the best candidate to the output.
    ///
    /// `track` must be the store's current selection. The active session is
    /// replaced immediately, so any earlier resolution still in flight can
    /// no longer apply its result.
    #[instrument(skip(self, track), fields(track_id = %track.id))]
    pub async fn resolve(&self, track: &Track) -> ResolveOutcome {
        if !self.store.is_current(&track.id) {
            return self.supersede(track);
        }

        let session_id = {
            let mut session = self.session.lock();
            *session = ResolutionSession::begin(&track.id);
            session.session_id.clone()
        };

        self.output.clear_source();
        self.begin_listen(track);
        info!(session_id = %session_id, "Resolving audio");
        self.emit(PlaybackEvent::Resolving {
            track_id: track.id.clone(),
            session_id: session_id.clone(),
        });

        let candidates = self.find_candidates(track).await;

        if !self.store.is_current(&track.id) {
            return self.supersede(track);
        }

        let first = {
            let mut session = self.session.lock();
            if session.session_id != session_id {
                None
            } else if candidates.is_empty() {
                session.exhaust();
                Some(None)
            } else {
                session.ready(candidates.clone());
                Some(candidates.first().cloned())
            }
        };

        match first {
            None => self.supersede(track),
            Some(None) => {
                warn!("No audio found for any query variant");
                self.store.signal_no_audio(&track.id);
                self.emit(PlaybackEvent::NoAudioFound {
                    track_id: track.id.clone(),
                });
                ResolveOutcome::Exhausted
            }
            Some(Some(url)) => {
                info!(url = %url, candidates = candidates.len(), "Audio source selected");
                self.output.set_source(&url);
                self.emit(PlaybackEvent::SourceSelected {
                    track_id: track.id.clone(),
                    url: url.clone(),
                    candidate_index: 0,
                    candidate_count: candidates.len(),
                });
                ResolveOutcome::Ready { url, candidates }
            }
        }
    }

    fn supersede(&self, track: &Track) -> ResolveOutcome {
        debug!("Selection changed while resolving, discarding result");
        self.emit(PlaybackEvent::Superseded {
            track_id: track.id.clone(),
        });
        ResolveOutcome::Superseded
    }

    async fn find_candidates(&self, track: &Track) -> Vec<String> {
        for (strategy, query) in build_queries(track).iter().enumerate() {
            let query = query.as_str();

            let urls = match self.cache.get(query).await {
                Some(urls) if !urls.is_empty() => urls,
                _ => {
                    let urls = self.lookup.lookup(query).await;
                    if !urls.is_empty() {
                        self.cache.put(query, &urls).await;
                    }
                    urls
                }
            };

            if !urls.is_empty() {
                debug!(strategy = strategy + 1, query = query, "Query variant matched");
                return urls;
            }
            debug!(strategy = strategy + 1, query = query, "Query variant found nothing");
        }

        Vec::new()
    }

    /// The media output failed to load or decode the active source.
    ///
    /// Ignored unless a source is active.
    pub fn on_playback_error(&self) {
        let fallback = self.session.lock().advance();
        let Some(fallback) = fallback else {
            debug!("Playback error with no active source, ignoring");
            return;
        };

        match fallback {
            Fallback::Next {
                track_id,
                failed_url,
                url,
                index,
                count,
            } => {
                warn!(
                    track_id = %track_id,
                    failed_url = %failed_url,
                    next = index + 1,
                    of = count,
                    "Audio source failed, trying next candidate"
                );
                self.emit(PlaybackEvent::SourceFailed {
                    track_id: track_id.clone(),
                    url: failed_url,
                    candidate_index: index - 1,
                });
                self.output.set_source(&url);
                self.emit(PlaybackEvent::SourceSelected {
                    track_id,
                    url,
                    candidate_index: index,
                    candidate_count: count,
                });
            }
            Fallback::Exhausted {
                track_id,
                failed_url,
                index,
            } => {
                warn!(track_id = %track_id, failed_url = %failed_url, "Every audio source failed");
                self.emit(PlaybackEvent::SourceFailed {
                    track_id: track_id.clone(),
                    url: failed_url,
                    candidate_index: index,
                });
                self.store.signal_playback_stalled(&track_id);
                self.emit(PlaybackEvent::Stalled { track_id });
                self.sync_playback_intent();
            }
        }
    }

    /// The media output can play the active source.
    pub fn on_playback_ready(&self) {
        let track_id = {
            let mut session = self.session.lock();
            if !session.is_ready() {
                return;
            }
            session.loading = false;
            session.track_id.clone()
        };

        if let Some(track_id) = track_id {
            debug!(track_id = %track_id, "Audio source ready");
            self.emit(PlaybackEvent::Ready { track_id });
        }

        if self.store.playback_intent().is_playing() {
            self.output.play();
        }
    }

    /// Forward a position update from the media output to the store.
    pub fn on_time_update(&self, current_secs: f64, duration_secs: f64) {
        if !current_secs.is_finite() {
            return;
        }

        let track_id = {
            let session = self.session.lock();
            if !session.is_ready() {
                return;
            }
            session.track_id.clone()
        };
        let Some(track_id) = track_id else {
            return;
        };

        let progress = if duration_secs.is_finite() && duration_secs > 0.0 {
            current_secs / duration_secs
        } else {
            0.0
        };
        self.store.set_progress(progress);
        self.store.set_current_time(current_secs);
        self.tracker.record_position(&track_id, current_secs);

        self.emit(PlaybackEvent::PositionChanged {
            track_id,
            position_ms: secs_to_millis(current_secs),
            duration_ms: secs_to_millis(duration_secs),
        });
    }

    /// The active source played to the end.
    pub fn on_playback_ended(&self) {
        debug!("Playback ended, advancing queue");
        self.store.next_track();
    }

    /// Play or pause the output to match the store's intent.
    ///
    /// Plays only once the active source has reported ready.
    pub fn sync_playback_intent(&self) {
        let playable = {
            let session = self.session.lock();
            session.is_ready() && !session.loading
        };

        if playable && self.store.playback_intent().is_playing() {
            self.output.play();
        } else {
            self.output.pause();
        }
    }

    /// Drive the engine from store events: resolve on every track change and
    /// sync the output on intent changes.
    ///
    /// Each resolution runs in its own task so a slow lookup never delays a
    /// newer selection.
    pub fn follow_track_changes(self: Arc<Self>, mut events: EventStream) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(CoreEvent::Playback(PlaybackEvent::TrackChanged { track_id, .. })) => {
                        let Some(track) = self
                            .store
                            .current_track()
                            .filter(|track| track.id == track_id)
                        else {
                            continue;
                        };
                        let engine = Arc::clone(&self);
                        tokio::spawn(async move {
                            engine.resolve(&track).await;
                        });
                    }
                    Ok(CoreEvent::Playback(
                        PlaybackEvent::Started { .. } | PlaybackEvent::Paused { .. },
                    )) => self.sync_playback_intent(),
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Engine fell behind on store events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Event bus closed, engine stopped following track changes");
        })
    }

    fn begin_listen(&self, track: &Track) {
        let Some(finished) = self.tracker.begin(&track.id, track.duration_secs) else {
            return;
        };
        let Some(listens) = &self.listens else {
            return;
        };
        self.submit_listen(listens, finished);
    }

    fn submit_listen(&self, listens: &ListenReporting, finished: FinishedListen) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(track_id = %finished.track_id, "No runtime, dropping listen report");
            return;
        };

        let reporter = Arc::clone(&listens.reporter);
        let user_id = listens.user_id.clone();
        handle.spawn(async move {
            reporter
                .report(
                    &finished.track_id,
                    &user_id,
                    finished.listened_secs,
                    finished.total_secs,
                )
                .await;
        });
    }
}

fn secs_to_millis(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * 1000.0).round() as u64
    } else {
        0
    }
}
