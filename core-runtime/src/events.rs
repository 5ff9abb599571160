//! # Event Bus System
//!
//! Provides an event-driven architecture for the Sonic audio core using
//! `tokio::sync::broadcast`. The resolution engine and the player store
//! publish typed events here; hosts subscribe to drive UI state (loading
//! spinners, "no audio found" toasts, progress bars).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   emit    ┌───────────┐
//! │ Resolution Engine├──────────>│           │   subscribe   ┌────────────┐
//! └──────────────────┘           │ EventBus  ├──────────────>│ Subscriber │
//! ┌──────────────────┐   emit    │ (broadcast│               └────────────┘
//! │ Audio URL Cache  ├──────────>│  channel) │   subscribe   ┌────────────┐
//! └──────────────────┘           │           ├──────────────>│ Subscriber │
//! ┌──────────────────┐   emit    │           │               └────────────┘
//! │ Player Store     ├──────────>│           │
//! └──────────────────┘           └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Playback(PlaybackEvent::NoAudioFound {
//!         track_id: "t-1".to_string(),
//!     }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event.description(), "No audio found for track");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! Emitting with no subscribers returns an error that publishers ignore.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Track selection, resolution and playback events
    Playback(PlaybackEvent),
    /// Audio URL cache events
    Cache(CacheEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Cache(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Stalled { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::NoAudioFound { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::SourceFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Cache(CacheEvent::WriteFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::SourceSelected { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::TrackChanged { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events related to track selection, audio resolution and playback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A new track became the current selection.
    TrackChanged { track_id: String, title: String },
    /// A resolution session started for the track.
    Resolving { track_id: String, session_id: String },
    /// A candidate URL was handed to the media output.
    SourceSelected {
        track_id: String,
        url: String,
        /// Zero-based position in the candidate list.
        candidate_index: usize,
        candidate_count: usize,
    },
    /// The media output rejected a candidate URL.
    SourceFailed {
        track_id: String,
        url: String,
        candidate_index: usize,
    },
    /// A resolution finished after the user had already moved on.
    Superseded { track_id: String },
    /// The media output reported the source is playable.
    Ready { track_id: String },
    /// No query variant produced any candidate URL.
    NoAudioFound { track_id: String },
    /// Every candidate URL failed to play.
    Stalled { track_id: String },
    /// Playback intent switched to playing.
    Started { track_id: String },
    /// Playback intent switched to paused.
    Paused { track_id: String },
    /// Playback position updated.
    PositionChanged {
        track_id: String,
        position_ms: u64,
        duration_ms: u64,
    },
    /// The current track played to the end.
    Completed { track_id: String },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::TrackChanged { .. } => "Track changed",
            PlaybackEvent::Resolving { .. } => "Resolving audio source",
            PlaybackEvent::SourceSelected { .. } => "Audio source selected",
            PlaybackEvent::SourceFailed { .. } => "Audio source failed",
            PlaybackEvent::Superseded { .. } => "Stale resolution discarded",
            PlaybackEvent::Ready { .. } => "Audio source ready",
            PlaybackEvent::NoAudioFound { .. } => "No audio found for track",
            PlaybackEvent::Stalled { .. } => "All audio sources failed",
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::PositionChanged { .. } => "Playback position changed",
            PlaybackEvent::Completed { .. } => "Track completed",
        }
    }
}

// ============================================================================
// Cache Events
// ============================================================================

/// Events emitted by the audio URL cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CacheEvent {
    Hit { query: String },
    Miss { query: String },
    Stored { query: String, url_count: usize },
    /// Oldest queries dropped to respect the configured bound.
    Evicted { count: usize },
    /// Persisting the cache blob failed.
    WriteFailed { message: String },
}

impl CacheEvent {
    fn description(&self) -> &str {
        match self {
            CacheEvent::Hit { .. } => "Audio cache hit",
            CacheEvent::Miss { .. } => "Audio cache miss",
            CacheEvent::Stored { .. } => "Audio URLs cached",
            CacheEvent::Evicted { .. } => "Audio cache entries evicted",
            CacheEvent::WriteFailed { .. } => "Audio cache write failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to core events.
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// When a subscriber falls behind by more than `capacity` events, it will
    /// receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    ///
    /// ```rust
    /// use core_runtime::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.subscriber_count(), 0);
    ///
    /// let _subscriber = event_bus.subscribe();
    /// assert_eq!(event_bus.subscriber_count(), 1);
    /// ```
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with filtering.
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, CoreEvent};
///
/// let event_bus = EventBus::new(100);
/// let cache_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Cache(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_audio(track_id: &str) -> CoreEvent {
        CoreEvent::Playback(PlaybackEvent::NoAudioFound {
            track_id: track_id.to_string(),
        })
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);

        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(no_audio("t-1")).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Playback(PlaybackEvent::SourceSelected {
            track_id: "t-1".to_string(),
            url: "https://cdn.example.com/a_320.mp4".to_string(),
            candidate_index: 0,
            candidate_count: 3,
        });

        assert_eq!(bus.emit(event.clone()).unwrap(), 2);
        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream =
            EventStream::new(bus.subscribe()).filter(|event| matches!(event, CoreEvent::Cache(_)));

        bus.emit(no_audio("t-1")).ok();
        let cache_event = CoreEvent::Cache(CacheEvent::Stored {
            query: "tum hi ho arijit singh audio".to_string(),
            url_count: 2,
        });
        bus.emit(cache_event.clone()).ok();

        assert_eq!(stream.recv().await.unwrap(), cache_event);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(no_audio(&format!("t-{}", i))).ok();
        }

        let result = sub.recv().await;
        assert!(matches!(result, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        let stalled = CoreEvent::Playback(PlaybackEvent::Stalled {
            track_id: "t-1".to_string(),
        });
        assert_eq!(stalled.severity(), EventSeverity::Error);
        assert_eq!(no_audio("t-1").severity(), EventSeverity::Warning);

        let position = CoreEvent::Playback(PlaybackEvent::PositionChanged {
            track_id: "t-1".to_string(),
            position_ms: 5000,
            duration_ms: 180000,
        });
        assert_eq!(position.severity(), EventSeverity::Debug);
    }

    #[tokio::test]
    async fn test_concurrent_publishers() {
        let bus = EventBus::new(100);
        let mut sub = bus.subscribe();

        let bus1 = bus.clone();
        let bus2 = bus.clone();

        let handle1 = tokio::spawn(async move {
            for i in 0..10 {
                bus1.emit(no_audio(&format!("t-{}", i))).ok();
            }
        });

        let handle2 = tokio::spawn(async move {
            for i in 0..10 {
                bus2.emit(CoreEvent::Cache(CacheEvent::Hit {
                    query: format!("query {}", i),
                }))
                .ok();
            }
        });

        handle1.await.ok();
        handle2.await.ok();

        let mut count = 0;
        while sub.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 20);
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Cache(CacheEvent::Evicted { count: 3 });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Cache\""));
        assert!(json.contains("\"event\":\"Evicted\""));

        let deserialized: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[tokio::test]
    async fn test_try_recv_skips_filtered_events() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe()).filter(|event| {
            matches!(event, CoreEvent::Playback(PlaybackEvent::Stalled { .. }))
        });

        assert!(stream.try_recv().is_none());

        bus.emit(no_audio("t-1")).ok();
        assert!(stream.try_recv().is_none());

        let stalled = CoreEvent::Playback(PlaybackEvent::Stalled {
            track_id: "t-1".to_string(),
        });
        bus.emit(stalled.clone()).ok();
        assert_eq!(stream.try_recv().unwrap().unwrap(), stalled);
    }
}
