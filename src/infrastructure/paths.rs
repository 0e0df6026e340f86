//! Filesystem location defaults.
//!
//! This module resolves where the persisted state (favorites, preferences,
//! optionally the catalog seed) lives when the embedder does not override it.
//! Resolution follows the XDG convention with a home-relative fallback.

use std::path::PathBuf;

/// Returns the default data directory for flight search storage.
///
/// Resolution order:
/// 1. `$XDG_DATA_HOME/flightsearch` if `XDG_DATA_HOME` is set
/// 2. `$HOME/.local/share/flightsearch` if `HOME` is set
/// 3. `./flightsearch-data` as a last resort (no home available)
///
/// The favorites and preferences files are created inside this directory.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg).join("flightsearch");
    }
    if let Some(home) = std::env::var_os("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("flightsearch");
    }
    PathBuf::from("flightsearch-data")
}
