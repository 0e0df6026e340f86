//! Storage layer for persisted favorites and preferences.
//!
//! This module provides the persistence abstractions for the favorite-routes
//! set and the saved search query. Both use whole-file JSON with atomic writes;
//! live queries are served from watch channels updated synchronously with the
//! in-memory state.
//!
//! # Modules
//!
//! - `backend`: [`FavoriteStore`] trait abstraction
//! - `json`: JSON file-based favorite store implementation
//! - `models`: storage record types separate from domain models
//! - `prefs`: persisted last-query preference

pub mod backend;
pub mod json;
pub mod models;
pub mod prefs;

pub use backend::FavoriteStore;
pub use json::JsonFavoriteStore;
pub use models::FavoriteRecord;
pub use prefs::{JsonPreferences, Preferences};
