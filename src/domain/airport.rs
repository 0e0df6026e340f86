//! Airport domain model.
//!
//! This module defines the core `Airport` type: immutable reference data loaded
//! once at startup from the catalog seed and referenced (cloned) by routes and
//! display lists. Airports are never mutated or persisted by this crate.

use serde::{Deserialize, Serialize};

/// An airport known to the catalog.
///
/// Airports are read-only reference data owned by the
/// [`AirportCatalog`](crate::catalog::AirportCatalog). They are small and cheap
/// to clone, so routes and display lists carry owned copies rather than
/// references into the catalog.
///
/// # Fields
///
/// - `id`: stable integer identity from the seed data
/// - `iata_code`: three-letter IATA code, unique across the catalog
/// - `name`: full airport name for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airport {
    pub id: i64,
    pub iata_code: String,
    pub name: String,
}

impl Airport {
    /// Creates a new airport.
    ///
    /// # Examples
    ///
    /// ```
    /// use flightsearch::domain::Airport;
    ///
    /// let jfk = Airport::new(1, "JFK", "John F. Kennedy International Airport");
    /// assert_eq!(jfk.iata_code, "JFK");
    /// ```
    pub fn new(id: i64, iata_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            iata_code: iata_code.into(),
            name: name.into(),
        }
    }

    /// Case-insensitive match of `fragment` against the code or the name.
    ///
    /// This is the only matching rule the search path applies: plain substring
    /// containment, no ranking.
    #[must_use]
    pub fn matches(&self, fragment: &str) -> bool {
        let needle = fragment.to_lowercase();
        self.iata_code.to_lowercase().contains(&needle)
            || self.name.to_lowercase().contains(&needle)
    }
}
