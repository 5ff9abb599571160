//! Genre preference counter
//!
//! A tiny weighted-preference model: every play of a track with a genre bumps
//! that genre's score by one. Scores live as one JSON object in the
//! [`SettingsStore`] so they survive restarts.

use crate::error::Result;
use bridge_traits::storage::SettingsStore;
use core_runtime::config::{CoreConfig, DEFAULT_PREFERENCES_KEY};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

type Scores = HashMap<String, u64>;

pub struct GenrePreferences {
    store: Arc<dyn SettingsStore>,
    key: String,
}

impl GenrePreferences {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self::with_key(store, DEFAULT_PREFERENCES_KEY)
    }

    pub fn with_key(store: Arc<dyn SettingsStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::with_key(config.settings_store.clone(), config.preferences_key.clone())
    }

    /// Absent, unreadable and corrupt blobs all read as "no preferences".
    async fn load(&self) -> Scores {
        let raw = match self.store.get_string(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Scores::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read genre preferences");
                return Scores::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key = %self.key, error = %e, "Discarding corrupt genre preferences");
            Scores::new()
        })
    }

    /// Bump `genre` by one and persist. Returns the new score.
    ///
    /// Blank genres are ignored and score 0.
    pub async fn record_interaction(&self, genre: &str) -> Result<u64> {
        let genre = genre.trim();
        if genre.is_empty() {
            return Ok(0);
        }

        let mut scores = self.load().await;
        let score = scores.entry(genre.to_string()).or_insert(0);
        *score += 1;
        let new_score = *score;

        let blob = serde_json::to_string(&scores)?;
        self.store.set_string(&self.key, &blob).await?;

        debug!(genre = genre, score = new_score, "Upvoted genre");
        Ok(new_score)
    }

    /// Genres ordered by descending score; ties break alphabetically.
    pub async fn preferred_genres(&self) -> Vec<String> {
        let mut ranked: Vec<(String, u64)> = self.load().await.into_iter().collect();
        ranked.sort_by(|(genre_a, score_a), (genre_b, score_b)| {
            score_b.cmp(score_a).then_with(|| genre_a.cmp(genre_b))
        });
        ranked.into_iter().map(|(genre, _)| genre).collect()
    }

    pub async fn affinity_score(&self, genre: &str) -> u64 {
        if genre.trim().is_empty() {
            return 0;
        }
        self.load().await.get(genre.trim()).copied().unwrap_or(0)
    }
}
