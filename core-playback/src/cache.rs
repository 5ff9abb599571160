//! # Lookup Cache
//!
//! Maps a normalized query to the candidate URLs the lookup service returned
//! for it. [`SettingsAudioCache`] persists the whole map as one JSON object
//! under a single settings key, rewritten on every `put`.
//!
//! Entries never expire. An optional entry bound evicts the oldest inserted
//! queries first.

use crate::error::{PlaybackError, Result};
use async_trait::async_trait;
use bridge_traits::storage::SettingsStore;
use core_runtime::config::{CoreConfig, DEFAULT_CACHE_KEY};
use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Query → candidate URL cache used by the resolution engine.
///
/// Implementations never fail to the caller: unreadable state is a miss and
/// write failures are only logged.
#[async_trait]
pub trait AudioUrlCache: Send + Sync {
    /// Cached candidates for `query`, in lookup order.
    async fn get(&self, query: &str) -> Option<Vec<String>>;

    /// Store candidates for `query`, replacing any previous entry.
    async fn put(&self, query: &str, urls: &[String]);
}

/// Cache persisted through a [`SettingsStore`].
///
/// Read-modify-write is not synchronized across instances sharing a key;
/// the last writer wins.
pub struct SettingsAudioCache {
    store: Arc<dyn SettingsStore>,
    key: String,
    max_entries: Option<usize>,
    events: Option<EventBus>,
}

impl SettingsAudioCache {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            key: DEFAULT_CACHE_KEY.to_string(),
            max_entries: None,
            events: None,
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.settings_store.clone())
            .with_key(config.cache_key.clone())
            .with_max_entries(config.cache_max_entries)
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Bound the number of cached queries. `None` keeps every entry.
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn emit(&self, event: CacheEvent) {
        if let Some(events) = &self.events {
            let _ = events.emit(CoreEvent::Cache(event));
        }
    }

    async fn read_blob(&self) -> Result<Map<String, Value>> {
        let Some(raw) = self.store.get_string(&self.key).await? else {
            return Ok(Map::new());
        };

        serde_json::from_str(&raw).map_err(|e| PlaybackError::CorruptCache(e.to_string()))
    }

    /// The persisted map, or an empty one when it is absent or unreadable.
    async fn load(&self) -> Map<String, Value> {
        match self.read_blob().await {
            Ok(map) => map,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Treating audio cache as empty");
                Map::new()
            }
        }
    }

    async fn write(&self, map: &Map<String, Value>) -> Result<()> {
        let blob =
            serde_json::to_string(map).map_err(|e| PlaybackError::CorruptCache(e.to_string()))?;
        self.store.set_string(&self.key, &blob).await?;
        Ok(())
    }

    /// Number of cached queries.
    pub async fn len(&self) -> usize {
        self.load().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every cached entry.
    pub async fn clear(&self) -> Result<()> {
        self.store.delete(&self.key).await?;
        debug!(key = %self.key, "Cleared audio cache");
        Ok(())
    }
}

/// Drop the oldest entries until at most `max` remain. Returns how many went.
fn evict_oldest(map: Map<String, Value>, max: usize) -> (Map<String, Value>, usize) {
    let excess = map.len().saturating_sub(max);
    if excess == 0 {
        return (map, 0);
    }
    (map.into_iter().skip(excess).collect(), excess)
}

#[async_trait]
impl AudioUrlCache for SettingsAudioCache {
    async fn get(&self, query: &str) -> Option<Vec<String>> {
        let urls = self
            .load()
            .await
            .remove(query)
            .and_then(|value| serde_json::from_value::<Vec<String>>(value).ok());

        match &urls {
            Some(urls) => {
                debug!(query = query, count = urls.len(), "Audio cache hit");
                self.emit(CacheEvent::Hit {
                    query: query.to_string(),
                });
            }
            None => {
                debug!(query = query, "Audio cache miss");
                self.emit(CacheEvent::Miss {
                    query: query.to_string(),
                });
            }
        }

        urls
    }

    async fn put(&self, query: &str, urls: &[String]) {
        // Re-inserting moves the entry to the newest position
        let mut map: Map<String, Value> = self
            .load()
            .await
            .into_iter()
            .filter(|(key, _)| key != query)
            .collect();
        map.insert(query.to_string(), Value::from(urls.to_vec()));

        let evicted = match self.max_entries {
            Some(max) => {
                let (bounded, evicted) = evict_oldest(map, max);
                map = bounded;
                evicted
            }
            None => 0,
        };

        if let Err(e) = self.write(&map).await {
            warn!(query = query, error = %e, "Failed to persist audio cache");
            self.emit(CacheEvent::WriteFailed {
                message: e.to_string(),
            });
            return;
        }

        debug!(query = query, count = urls.len(), "Cached audio candidates");
        self.emit(CacheEvent::Stored {
            query: query.to_string(),
            url_count: urls.len(),
        });
        if evicted > 0 {
            debug!(evicted, "Evicted oldest audio cache entries");
            self.emit(CacheEvent::Evicted { count: evicted });
        }
    }
}
