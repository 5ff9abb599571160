//! # Core Configuration Module
//!
//! Provides configuration management for the Sonic audio core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance holding the bridges and tunables the resolution engine needs.
//! It enforces fail-fast validation so a misconfigured endpoint or a missing
//! bridge is reported before any track is resolved.
//!
//! ## Bridges
//!
//! - `HttpClient` - Song search lookups and listen reports (desktop default: reqwest)
//! - `SettingsStore` - Durable audio URL cache and genre preferences
//!   (desktop default: SQLite at `settings_db_path`)
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults are
//! injected automatically if not provided. Without it, a missing bridge is a
//! [`Error::CapabilityMissing`].
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .settings_db_path("/path/to/settings.db")
//!     .lookup_timeout(Duration::from_secs(8))
//!     .cache_max_entries(5_000)
//!     .build()?;
//! ```
//!
//! ### Configuration with Custom Bridges
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .search_endpoint("https://mirror.example.com/api/search/songs")
//!     .http_client(Arc::new(MyHttpClient))
//!     .settings_store(Arc::new(MySettingsStore))
//!     .backend_base_url("https://api.example.com/api")
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{HttpClient, SettingsStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default song search endpoint.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://saavn.sumit.co/api/search/songs";

/// Default settings key holding the audio URL cache blob.
pub const DEFAULT_CACHE_KEY: &str = "sonic_audio_cache_v1";

/// Default settings key holding genre preference counters.
pub const DEFAULT_PREFERENCES_KEY: &str = "sonicstream_preferences";

/// Core configuration for the Sonic audio core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Full URL of the song search endpoint; `?query=` is appended per lookup
    pub search_endpoint: String,

    /// Settings key the audio URL cache is persisted under
    pub cache_key: String,

    /// Upper bound on cached queries; `None` keeps the cache unbounded
    pub cache_max_entries: Option<usize>,

    /// Per-request timeout for song search lookups; `None` uses the transport default
    pub lookup_timeout: Option<Duration>,

    /// Base URL of the listen-tracking backend; `None` disables listen reporting
    pub backend_base_url: Option<String>,

    /// Settings key the genre preference counters are persisted under
    pub preferences_key: String,

    /// Capacity of the core event bus
    pub event_buffer_size: usize,

    /// HTTP client for lookups and listen reports
    pub http_client: Arc<dyn HttpClient>,

    /// Durable key-value storage
    pub settings_store: Arc<dyn SettingsStore>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("search_endpoint", &self.search_endpoint)
            .field("cache_key", &self.cache_key)
            .field("cache_max_entries", &self.cache_max_entries)
            .field("lookup_timeout", &self.lookup_timeout)
            .field("backend_base_url", &self.backend_base_url)
            .field("preferences_key", &self.preferences_key)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("http_client", &"HttpClient { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .finish()
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Search endpoint is an http(s) URL
    /// - Cache and preference keys are not empty
    /// - Cache bound, lookup timeout and event buffer are non-zero when set
    /// - Backend base URL, when set, is an http(s) URL
    pub fn validate(&self) -> Result<()> {
        if self.search_endpoint.trim().is_empty() {
            return Err(Error::Config(
                "Search endpoint cannot be empty".to_string(),
            ));
        }

        if !is_http_url(&self.search_endpoint) {
            return Err(Error::Config(format!(
                "Search endpoint must be an http(s) URL, got '{}'",
                self.search_endpoint
            )));
        }

        if self.cache_key.trim().is_empty() {
            return Err(Error::Config("Cache key cannot be empty".to_string()));
        }

        if self.preferences_key.trim().is_empty() {
            return Err(Error::Config(
                "Preferences key cannot be empty".to_string(),
            ));
        }

        if self.cache_max_entries == Some(0) {
            return Err(Error::Config(
                "Cache bound must be greater than 0 entries. \
                 Leave it unset for an unbounded cache."
                    .to_string(),
            ));
        }

        if self.lookup_timeout == Some(Duration::ZERO) {
            return Err(Error::Config(
                "Lookup timeout must be greater than 0".to_string(),
            ));
        }

        if let Some(ref base) = self.backend_base_url {
            if !is_http_url(base) {
                return Err(Error::Config(format!(
                    "Backend base URL must be an http(s) URL, got '{}'",
                    base
                )));
            }
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for song search lookups. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ReqwestHttpClient. \
                 Other hosts: inject a platform HTTP client."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for the audio URL cache. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default SqliteSettingsStore. \
                 Web: inject a localStorage-based settings store."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(path: Option<PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use std::thread;
    use tokio::runtime::{Handle, Runtime};

    let path = path.ok_or_else(|| {
        Error::Config(
            "Settings database path is required when no SettingsStore is injected. \
             Use .settings_db_path() or .settings_store()."
                .to_string(),
        )
    })?;

    let init_store = |path: PathBuf| -> Result<_> {
        let runtime = Runtime::new().map_err(|e| {
            Error::Internal(format!(
                "Failed to create Tokio runtime for default settings store: {}",
                e
            ))
        })?;

        runtime
            .block_on(SqliteSettingsStore::new(path))
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
            })
    };

    // block_on panics inside a runtime, so initialise on a scratch thread there
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(path))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Worker thread panicked while creating default SettingsStore".to_string(),
                )
            })??,
        Err(_) => init_store(path)?,
    };

    let store: Arc<dyn SettingsStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(_path: Option<PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    Err(settings_store_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Unset values fall back to the `DEFAULT_*` constants of this module.
#[derive(Default)]
pub struct CoreConfigBuilder {
    search_endpoint: Option<String>,
    cache_key: Option<String>,
    cache_max_entries: Option<usize>,
    lookup_timeout: Option<Duration>,
    backend_base_url: Option<String>,
    preferences_key: Option<String>,
    event_buffer_size: Option<usize>,
    settings_db_path: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
}

impl CoreConfigBuilder {
    /// Sets the song search endpoint.
    ///
    /// Default: [`DEFAULT_SEARCH_ENDPOINT`]
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .search_endpoint("https://mirror.example.com/api/search/songs");
    /// ```
    pub fn search_endpoint(mut self, url: impl Into<String>) -> Self {
        self.search_endpoint = Some(url.into());
        self
    }

    /// Sets the settings key for the audio URL cache.
    ///
    /// Default: [`DEFAULT_CACHE_KEY`]
    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Bounds the audio URL cache; the oldest queries are evicted first.
    ///
    /// Default: unbounded
    pub fn cache_max_entries(mut self, max_entries: usize) -> Self {
        self.cache_max_entries = Some(max_entries);
        self
    }

    /// Sets the per-request timeout for song search lookups.
    pub fn lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = Some(timeout);
        self
    }

    /// Enables listen reporting against the given backend base URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .backend_base_url("http://localhost:8000/api");
    /// ```
    pub fn backend_base_url(mut self, url: impl Into<String>) -> Self {
        self.backend_base_url = Some(url.into());
        self
    }

    /// Sets the settings key for genre preferences.
    ///
    /// Default: [`DEFAULT_PREFERENCES_KEY`]
    pub fn preferences_key(mut self, key: impl Into<String>) -> Self {
        self.preferences_key = Some(key.into());
        self
    }

    /// Sets the event bus capacity.
    ///
    /// Default: [`crate::events::DEFAULT_EVENT_BUFFER_SIZE`]
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets where the default SQLite settings store keeps its database.
    ///
    /// Only used when no [`SettingsStore`] is injected and the
    /// `desktop-shims` feature is enabled.
    pub fn settings_db_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_db_path = Some(path.into());
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the settings store implementation.
    ///
    /// If not provided, the desktop default (SQLite-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - A bridge is missing and no desktop default is available
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(self.settings_db_path)?,
        };

        let config = CoreConfig {
            search_endpoint: self
                .search_endpoint
                .unwrap_or_else(|| DEFAULT_SEARCH_ENDPOINT.to_string()),
            cache_key: self
                .cache_key
                .unwrap_or_else(|| DEFAULT_CACHE_KEY.to_string()),
            cache_max_entries: self.cache_max_entries,
            lookup_timeout: self.lookup_timeout,
            backend_base_url: self
                .backend_base_url
                .map(|url| url.trim_end_matches('/').to_string()),
            preferences_key: self
                .preferences_key
                .unwrap_or_else(|| DEFAULT_PREFERENCES_KEY.to_string()),
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            http_client,
            settings_store,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{BridgeError, HttpRequest, HttpResponse};

    #[cfg(feature = "desktop-shims")]
    use tokio::runtime::Runtime;
    #[cfg(feature = "desktop-shims")]
    use uuid::Uuid;

    struct MockHttpClient;

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn execute(
            &self,
            _request: HttpRequest,
        ) -> std::result::Result<HttpResponse, BridgeError> {
            Err(BridgeError::NotAvailable("offline".to_string()))
        }
    }

    struct MockSettingsStore;

    #[async_trait]
    impl SettingsStore for MockSettingsStore {
        async fn set_string(
            &self,
            _key: &str,
            _value: &str,
        ) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn get_string(&self, _key: &str) -> std::result::Result<Option<String>, BridgeError> {
            Ok(None)
        }

        async fn delete(&self, _key: &str) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn list_keys(&self) -> std::result::Result<Vec<String>, BridgeError> {
            Ok(Vec::new())
        }

        async fn clear_all(&self) -> std::result::Result<(), BridgeError> {
            Ok(())
        }
    }

    fn builder_with_mocks() -> CoreConfigBuilder {
        CoreConfig::builder()
            .http_client(Arc::new(MockHttpClient))
            .settings_store(Arc::new(MockSettingsStore))
    }

    #[test]
    fn test_builder_applies_defaults() {
        let config = builder_with_mocks().build().unwrap();

        assert_eq!(config.search_endpoint, DEFAULT_SEARCH_ENDPOINT);
        assert_eq!(config.cache_key, DEFAULT_CACHE_KEY);
        assert_eq!(config.preferences_key, DEFAULT_PREFERENCES_KEY);
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert_eq!(config.cache_max_entries, None);
        assert_eq!(config.lookup_timeout, None);
        assert_eq!(config.backend_base_url, None);
    }

    #[test]
    fn test_builder_with_custom_values() {
        let config = builder_with_mocks()
            .search_endpoint("https://mirror.example.com/api/search/songs")
            .cache_key("custom_cache")
            .cache_max_entries(500)
            .lookup_timeout(Duration::from_secs(5))
            .backend_base_url("http://localhost:8000/api/")
            .event_buffer_size(16)
            .build()
            .unwrap();

        assert_eq!(
            config.search_endpoint,
            "https://mirror.example.com/api/search/songs"
        );
        assert_eq!(config.cache_key, "custom_cache");
        assert_eq!(config.cache_max_entries, Some(500));
        assert_eq!(config.lookup_timeout, Some(Duration::from_secs(5)));
        assert_eq!(
            config.backend_base_url.as_deref(),
            Some("http://localhost:8000/api")
        );
        assert_eq!(config.event_buffer_size, 16);
    }

    #[test]
    fn test_validate_rejects_non_http_endpoint() {
        let result = builder_with_mocks()
            .search_endpoint("ftp://example.com/search")
            .build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must be an http(s) URL"));
    }

    #[test]
    fn test_validate_rejects_empty_endpoint() {
        let result = builder_with_mocks().search_endpoint("  ").build();

        assert!(result.unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_validate_rejects_empty_cache_key() {
        let result = builder_with_mocks().cache_key("").build();

        assert!(result.unwrap_err().to_string().contains("Cache key"));
    }

    #[test]
    fn test_validate_rejects_zero_cache_bound() {
        let result = builder_with_mocks().cache_max_entries(0).build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must be greater than 0 entries"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let result = builder_with_mocks().lookup_timeout(Duration::ZERO).build();

        assert!(result.unwrap_err().to_string().contains("Lookup timeout"));
    }

    #[test]
    fn test_validate_rejects_bad_backend_url() {
        let result = builder_with_mocks().backend_base_url("/api").build();

        assert!(result.unwrap_err().to_string().contains("Backend base URL"));
    }

    #[test]
    fn test_validate_rejects_zero_event_buffer() {
        let result = builder_with_mocks().event_buffer_size(0).build();

        assert!(result.unwrap_err().to_string().contains("Event buffer"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_http_client() {
        let result = CoreConfig::builder()
            .settings_store(Arc::new(MockSettingsStore))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("HttpClient"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_settings_store() {
        let result = CoreConfig::builder()
            .http_client(Arc::new(MockHttpClient))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("SettingsStore"));
        assert!(err_msg.contains("audio URL cache"));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_default_requires_settings_path() {
        let result = CoreConfig::builder()
            .http_client(Arc::new(MockHttpClient))
            .build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Settings database path is required"));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let base = std::env::temp_dir().join(format!("core-runtime-test-{}", Uuid::new_v4()));

        let config = CoreConfig::builder()
            .settings_db_path(base.join("settings.db"))
            .build()
            .expect("desktop defaults should succeed");

        let settings = config.settings_store.clone();
        let rt = Runtime::new().expect("runtime");
        rt.block_on(async {
            settings.set_string("theme", "dark").await.unwrap();
            let value = settings.get_string("theme").await.unwrap();
            assert_eq!(value.as_deref(), Some("dark"));
        });

        drop(config);
        let _ = std::fs::remove_dir_all(&base);
    }

    #[test]
    fn test_config_debug_hides_bridges() {
        let config = builder_with_mocks().build().unwrap();
        let debug = format!("{:?}", config);

        assert!(debug.contains("HttpClient { ... }"));
        assert!(debug.contains(DEFAULT_CACHE_KEY));
    }

    #[test]
    fn test_config_is_cloneable() {
        let config = builder_with_mocks().cache_max_entries(10).build().unwrap();

        let cloned = config.clone();
        assert_eq!(cloned.cache_max_entries, config.cache_max_entries);
        assert!(Arc::ptr_eq(&cloned.http_client, &config.http_client));
    }
}
