//! # Playback Error Types
//!
//! Errors raised inside the audio resolution pipeline. Most of them never
//! reach callers: lookup and cache failures are logged and degraded to
//! "no candidates" at the component boundary.

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors that can occur while resolving audio for a track.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// The search request could not be sent or completed.
    #[error("Lookup request failed: {0}")]
    LookupFailed(String),

    /// The search service answered with a non-2xx status.
    #[error("Lookup returned HTTP {0}")]
    LookupStatus(u16),

    /// The search service answered but flagged the search as unsuccessful.
    #[error("Lookup reported failure")]
    LookupUnsuccessful,

    /// The response body was not the expected JSON shape.
    #[error("Malformed lookup response: {0}")]
    MalformedResponse(String),

    // ========================================================================
    // Cache Errors
    // ========================================================================
    /// The persisted cache blob could not be decoded.
    #[error("Corrupt cache blob: {0}")]
    CorruptCache(String),

    /// The settings store rejected a read or write.
    #[error("Cache storage error: {0}")]
    CacheStorage(#[from] BridgeError),
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
