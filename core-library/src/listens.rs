//! Listen reporting
//!
//! When the selection moves on, the time actually spent listening to the
//! previous track is posted to the tracking backend. [`ListenTracker`]
//! accumulates listened seconds from position updates; [`ListenReporter`]
//! turns a finished listen into a `POST {backend}/track`.

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bridge_traits::time::{Clock, SystemClock};
use core_runtime::config::CoreConfig;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Listens shorter than this are accidental clicks and are not reported.
pub const MIN_LISTEN_SECS: f64 = 2.0;

/// A listen covering more than this fraction of the track counts as complete.
pub const COMPLETE_THRESHOLD: f64 = 0.9;

/// Position jumps larger than this are seeks, not listening.
pub const MAX_POSITION_STEP_SECS: f64 = 5.0;

/// Wire payload for one listen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenReport {
    pub user_id: String,
    pub song_id: String,
    /// Unix epoch milliseconds
    pub timestamp: i64,
    pub duration_listened: f64,
    pub total_duration: f64,
    pub percent_listened: f64,
    pub is_complete: bool,
}

impl ListenReport {
    /// Build a report, or `None` for listens under [`MIN_LISTEN_SECS`].
    pub fn new(
        track_id: &str,
        user_id: &str,
        listened_secs: f64,
        total_secs: f64,
        timestamp: i64,
    ) -> Option<Self> {
        if !(listened_secs >= MIN_LISTEN_SECS) {
            return None;
        }

        let percent = if total_secs > 0.0 {
            listened_secs / total_secs
        } else {
            0.0
        };

        Some(Self {
            user_id: user_id.to_string(),
            song_id: track_id.to_string(),
            timestamp,
            duration_listened: listened_secs,
            total_duration: total_secs,
            percent_listened: percent,
            is_complete: percent > COMPLETE_THRESHOLD,
        })
    }
}

/// Posts listen reports to `{backend_base_url}/track`.
pub struct ListenReporter {
    http: Arc<dyn HttpClient>,
    endpoint: String,
    clock: Arc<dyn Clock>,
}

impl ListenReporter {
    pub fn new(http: Arc<dyn HttpClient>, backend_base_url: &str) -> Self {
        Self {
            http,
            endpoint: format!("{}/track", backend_base_url.trim_end_matches('/')),
            clock: Arc::new(SystemClock),
        }
    }

    /// `None` when the config has no backend URL.
    pub fn from_config(config: &CoreConfig) -> Option<Self> {
        config
            .backend_base_url
            .as_deref()
            .map(|base| Self::new(config.http_client.clone(), base))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Report one listen. Returns whether the backend accepted it.
    ///
    /// Short listens are skipped. Failures are logged, never raised.
    pub async fn report(
        &self,
        track_id: &str,
        user_id: &str,
        listened_secs: f64,
        total_secs: f64,
    ) -> bool {
        let Some(report) = ListenReport::new(
            track_id,
            user_id,
            listened_secs,
            total_secs,
            self.clock.unix_timestamp_millis(),
        ) else {
            debug!(track_id = track_id, listened_secs, "Listen too short to report");
            return false;
        };

        let request = match HttpRequest::new(HttpMethod::Post, &self.endpoint).json(&report) {
            Ok(request) => request,
            Err(e) => {
                warn!(track_id = track_id, error = %e, "Failed to encode listen report");
                return false;
            }
        };

        match self.http.execute(request).await {
            Ok(response) if response.is_success() => {
                debug!(
                    track_id = track_id,
                    percent = report.percent_listened,
                    complete = report.is_complete,
                    "Listen recorded"
                );
                true
            }
            Ok(response) => {
                warn!(track_id = track_id, status = response.status, "Listen report rejected");
                false
            }
            Err(e) => {
                warn!(track_id = track_id, error = %e, "Failed to record listen");
                false
            }
        }
    }
}

/// A listen that ended because the selection changed.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedListen {
    pub track_id: String,
    pub listened_secs: f64,
    pub total_secs: f64,
}

#[derive(Debug)]
struct ActiveListen {
    track_id: String,
    total_secs: f64,
    listened_secs: f64,
    last_position: Option<f64>,
}

/// Accumulates listened time for the current track.
#[derive(Debug, Default)]
pub struct ListenTracker {
    active: Mutex<Option<ActiveListen>>,
}

impl ListenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `track_id`, returning the listen it replaces.
    ///
    /// Re-beginning the same track keeps accumulating.
    pub fn begin(&self, track_id: &str, total_secs: f64) -> Option<FinishedListen> {
        let mut active = self.active.lock();
        if active.as_ref().map_or(false, |a| a.track_id == track_id) {
            return None;
        }

        let previous = active.take().map(Self::finish_listen);
        *active = Some(ActiveListen {
            track_id: track_id.to_string(),
            total_secs,
            listened_secs: 0.0,
            last_position: None,
        });
        previous.filter(|listen| listen.listened_secs > 0.0)
    }

    /// Feed a playback position; small forward steps count as listening.
    pub fn record_position(&self, track_id: &str, position_secs: f64) {
        if !position_secs.is_finite() {
            return;
        }

        let mut active = self.active.lock();
        let Some(listen) = active.as_mut().filter(|a| a.track_id == track_id) else {
            return;
        };

        if let Some(last) = listen.last_position {
            let step = position_secs - last;
            if step > 0.0 && step <= MAX_POSITION_STEP_SECS {
                listen.listened_secs += step;
            }
        }
        listen.last_position = Some(position_secs);
    }

    /// Seconds listened so far on the active track.
    pub fn listened_secs(&self) -> f64 {
        self.active
            .lock()
            .as_ref()
            .map_or(0.0, |listen| listen.listened_secs)
    }

    fn finish_listen(listen: ActiveListen) -> FinishedListen {
        FinishedListen {
            track_id: listen.track_id,
            listened_secs: listen.listened_secs,
            total_secs: listen.total_secs,
        }
    }
}
