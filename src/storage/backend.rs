//! Favorite store abstraction.
//!
//! This module defines the [`FavoriteStore`] trait that abstracts over
//! persistence backends for the favorite-routes set. The trait is minimal and
//! focused on the operations the core actually issues, not a generic ORM: two
//! live queries, one point-in-time read, and two mutations.
//!
//! # Design Philosophy
//!
//! Queries are **live**: `all()` re-emits on every mutation, and
//! `is_favorite()` is a per-key flag that flips as that one route enters or
//! leaves the set. This is what lets a displayed list stay correct without a
//! reload — consumers subscribe once and receive patches.

use async_trait::async_trait;

use crate::domain::error::Result;
use crate::live::Live;
use crate::storage::models::FavoriteRecord;

/// Abstraction over persistent favorite-route storage.
///
/// # Implementations
///
/// - [`JsonFavoriteStore`](crate::storage::JsonFavoriteStore): JSON file with
///   atomic writes (default)
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// Live view of every stored favorite, ordered by creation time.
    ///
    /// Re-emits the full set after every successful mutation.
    fn all(&self) -> Live<Vec<FavoriteRecord>>;

    /// Live flag for a single route's membership.
    ///
    /// The returned view carries the current membership immediately and flips
    /// whenever a mutation touches this key.
    fn is_favorite(&self, departure_code: &str, destination_code: &str) -> Live<bool>;

    /// Point-in-time membership read, not subscribed.
    ///
    /// This is the read half of a toggle's read-then-write; callers serialize
    /// around it per route key.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    async fn contains(&self, departure_code: &str, destination_code: &str) -> Result<bool>;

    /// Adds a favorite. Idempotent: adding an existing key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be persisted. The in-memory set
    /// is updated regardless; persistence failures degrade durability, not
    /// the session.
    async fn add(&self, departure_code: &str, destination_code: &str) -> Result<()>;

    /// Removes a favorite. Idempotent: removing an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    async fn remove(&self, departure_code: &str, destination_code: &str) -> Result<()>;
}
