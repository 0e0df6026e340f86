//! Storage record models for the persistence layer.
//!
//! These are the raw record types written to disk, kept separate from domain
//! models to maintain a clear boundary between storage representation and
//! business logic. Airports hydrated onto a favorite for display are domain
//! data and never appear here.

use serde::{Deserialize, Serialize};

use crate::domain::RouteKey;

/// A persisted favorite route.
///
/// The `(departure_code, destination_code)` pair is the unique key. Records are
/// created on toggle-add and destroyed on toggle-remove or deletion; they are
/// never updated in place (a toggle is a delete+insert, not a mutation of an
/// existing key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    /// IATA code of the departure airport.
    pub departure_code: String,

    /// IATA code of the destination airport.
    pub destination_code: String,

    /// Unix timestamp when the favorite was added. Persisted for ordering,
    /// never interpreted by the core.
    pub created_at: i64,
}

impl FavoriteRecord {
    /// Creates a record stamped with the current time.
    ///
    /// # Examples
    ///
    /// ```
    /// use flightsearch::storage::FavoriteRecord;
    ///
    /// let record = FavoriteRecord::new("JFK", "LAX");
    /// assert_eq!(record.departure_code, "JFK");
    /// assert!(record.created_at > 0);
    /// ```
    pub fn new(departure_code: impl Into<String>, destination_code: impl Into<String>) -> Self {
        Self {
            departure_code: departure_code.into(),
            destination_code: destination_code.into(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// The route identity of this record.
    #[must_use]
    pub fn key(&self) -> RouteKey {
        RouteKey::new(&self.departure_code, &self.destination_code)
    }
}
