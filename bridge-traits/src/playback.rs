//! Media output bridge.
//!
//! The host owns the actual audio element (a native `<audio>` tag, a rodio
//! sink, a platform player). The resolution core only tells it which URL to
//! load and whether to play; decode success or failure comes back through the
//! engine's `on_playback_ready` / `on_playback_error` callbacks.

/// Audio sink driven by the resolution engine.
///
/// All methods are synchronous commands; implementations that talk to an
/// async player should enqueue the command and return immediately. They must
/// not call back into the engine synchronously from these methods.
pub trait MediaOutput: Send + Sync {
    /// Load `url` as the active source, replacing any previous one.
    fn set_source(&self, url: &str);

    /// Drop the active source so nothing stale keeps playing.
    fn clear_source(&self);

    /// Start or resume playback of the active source.
    fn play(&self);

    /// Pause playback.
    fn pause(&self);
}

/// Media output that ignores every command.
///
/// Useful for headless hosts that only want the resolved URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMediaOutput;

impl MediaOutput for NullMediaOutput {
    fn set_source(&self, _url: &str) {}

    fn clear_source(&self) {}

    fn play(&self) {}

    fn pause(&self) {}
}
