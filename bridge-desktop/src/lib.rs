//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` (rustls, pooled connections, retry with backoff)
//! - `SettingsStore` using a SQLite-backed key-value table
//!
//! Media output is always host-specific, so no desktop `MediaOutput` lives
//! here; headless hosts can use `bridge_traits::NullMediaOutput`.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteSettingsStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http = Arc::new(ReqwestHttpClient::new());
//!     let settings = Arc::new(SqliteSettingsStore::new("sonic/settings.db".into()).await?);
//!     // Hand both to core_runtime::CoreConfig::builder()
//!     Ok(())
//! }
//! ```

mod http;
mod settings;

pub use http::ReqwestHttpClient;
pub use settings::SqliteSettingsStore;
