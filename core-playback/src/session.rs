//! # Resolution Session
//!
//! Per-selection state of the candidate list:
//!
//! ```text
//! Idle ──resolve──▶ Resolving ──candidates──▶ Ready ──last candidate fails──▶ Exhausted
//!                       └────────no candidates─────────────────────────────▶ Exhausted
//! ```
//!
//! A new selection always starts a fresh session; nothing carries over.

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStatus {
    Idle,
    Resolving,
    Ready,
    Exhausted,
}

/// Snapshot of the engine's active session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSession {
    pub session_id: String,
    /// `None` only while idle.
    pub track_id: Option<String>,
    pub candidates: Vec<String>,
    pub current_index: usize,
    pub status: ResolutionStatus,
    /// True from selection until the media output reports the source ready.
    pub loading: bool,
}

/// What a playback error did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fallback {
    /// Moved on to the candidate at `index`.
    Next {
        track_id: String,
        failed_url: String,
        url: String,
        index: usize,
        count: usize,
    },
    /// The failed URL was the last candidate.
    Exhausted {
        track_id: String,
        failed_url: String,
        index: usize,
    },
}

impl Default for ResolutionSession {
    fn default() -> Self {
        Self::idle()
    }
}

impl ResolutionSession {
    pub fn idle() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            track_id: None,
            candidates: Vec::new(),
            current_index: 0,
            status: ResolutionStatus::Idle,
            loading: false,
        }
    }

    pub(crate) fn begin(track_id: &str) -> Self {
        Self {
            track_id: Some(track_id.to_string()),
            status: ResolutionStatus::Resolving,
            loading: true,
            ..Self::idle()
        }
    }

    /// The URL the media output should currently be playing.
    pub fn current_url(&self) -> Option<&str> {
        match self.status {
            ResolutionStatus::Ready => self.candidates.get(self.current_index).map(String::as_str),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == ResolutionStatus::Ready
    }

    pub(crate) fn ready(&mut self, candidates: Vec<String>) {
        self.candidates = candidates;
        self.current_index = 0;
        self.status = ResolutionStatus::Ready;
    }

    pub(crate) fn exhaust(&mut self) {
        self.status = ResolutionStatus::Exhausted;
        self.loading = false;
    }

    /// Step past the failing candidate. Only meaningful while ready.
    pub(crate) fn advance(&mut self) -> Option<Fallback> {
        if self.status != ResolutionStatus::Ready {
            return None;
        }

        let track_id = self.track_id.clone()?;
        let failed_url = self.candidates.get(self.current_index)?.clone();
        let index = self.current_index + 1;

        match self.candidates.get(index) {
            Some(url) => {
                self.current_index = index;
                self.loading = true;
                Some(Fallback::Next {
                    track_id,
                    failed_url,
                    url: url.clone(),
                    index,
                    count: self.candidates.len(),
                })
            }
            None => {
                let index = self.current_index;
                self.exhaust();
                Some(Fallback::Exhausted {
                    track_id,
                    failed_url,
                    index,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_session(urls: &[&str]) -> ResolutionSession {
        let mut session = ResolutionSession::begin("t-1");
        session.ready(urls.iter().map(|u| u.to_string()).collect());
        session
    }

    #[test]
    fn test_new_sessions_are_distinct() {
        let a = ResolutionSession::begin("t-1");
        let b = ResolutionSession::begin("t-1");

        assert_ne!(a.session_id, b.session_id);
        assert_eq!(a.status, ResolutionStatus::Resolving);
        assert!(a.loading);
        assert!(a.current_url().is_none());
    }

    #[test]
    fn test_advance_walks_each_candidate_once() {
        let mut session = ready_session(&["u0", "u1", "u2"]);
        assert_eq!(session.current_url(), Some("u0"));

        assert!(matches!(
            session.advance(),
            Some(Fallback::Next { ref url, index: 1, count: 3, .. }) if url == "u1"
        ));
        assert!(matches!(
            session.advance(),
            Some(Fallback::Next { ref failed_url, index: 2, .. }) if failed_url == "u1"
        ));
        assert_eq!(
            session.advance(),
            Some(Fallback::Exhausted {
                track_id: "t-1".to_string(),
                failed_url: "u2".to_string(),
                index: 2,
            })
        );

        assert_eq!(session.status, ResolutionStatus::Exhausted);
        assert!(!session.loading);
        assert!(session.advance().is_none());
    }

    #[test]
    fn test_advance_ignored_outside_ready() {
        assert!(ResolutionSession::idle().advance().is_none());
        assert!(ResolutionSession::begin("t-1").advance().is_none());
    }

    #[test]
    fn test_single_candidate_exhausts_on_first_error() {
        let mut session = ready_session(&["only"]);
        assert!(matches!(session.advance(), Some(Fallback::Exhausted { index: 0, .. })));
    }
}
