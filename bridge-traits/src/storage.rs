//! Durable Key-Value Storage Abstraction
//!
//! The core keeps small persisted blobs (the audio URL cache, genre
//! preference counters) in a flat key-value store that survives restarts.

use async_trait::async_trait;

use crate::error::Result;

/// Key-value settings storage trait
///
/// Abstracts platform-specific durable key-value storage:
/// - Desktop: SQLite-backed table (`bridge_desktop::SqliteSettingsStore`)
/// - Web: localStorage
/// - iOS/Android: UserDefaults / DataStore
///
/// Values are opaque strings; callers that need structure serialize JSON.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn save_blob(store: &dyn SettingsStore, blob: &str) -> Result<()> {
///     store.set_string("sonic_audio_cache_v1", blob).await
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns an error when the backend rejects the write (e.g. quota or I/O failure).
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value, `Ok(None)` if the key doesn't exist
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Clear all settings
    async fn clear_all(&self) -> Result<()>;
}
