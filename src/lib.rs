//! Workspace placeholder crate.
//!
//! This crate exposes the workspace's feature flags and re-exports the member
//! crates (`core-runtime`, `core-library`, `core-playback`) so that host
//! applications can depend on `sonic-workspace` without wiring each crate
//! individually.

pub use bridge_traits;
pub use core_library;
pub use core_playback;
pub use core_runtime;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;
