//! Route domain model and list identity.
//!
//! A route is an ordered departure/destination airport pair, not necessarily a
//! real scheduled flight: any two distinct known airports form a valid route in
//! this domain. List-diffing identity is the ordered pair of IATA codes
//! ([`RouteKey`]), never object identity, so a route survives a list reshuffle
//! and a favorite-flag patch can find its item in place.

use serde::{Deserialize, Serialize};

use super::airport::Airport;

/// A departure/destination pair with its live favorite flag.
///
/// Routes are constructed per composer run and discarded when the view moves
/// away from the flight list; they are never persisted. `is_favorite` mirrors
/// the favorite store's state for this code pair and starts out provisional
/// (`false`) until the per-route status watcher delivers the stored truth.
///
/// Invariant: `departure.iata_code != destination.iata_code`, enforced by the
/// only constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub departure: Airport,
    pub destination: Airport,
    pub is_favorite: bool,
}

impl Route {
    /// Creates a route with a provisional (`false`) favorite flag.
    ///
    /// Returns `None` when departure and destination share an IATA code; a
    /// self-route is meaningless here and callers drop it.
    #[must_use]
    pub fn new(departure: Airport, destination: Airport) -> Option<Self> {
        if departure.iata_code == destination.iata_code {
            return None;
        }
        Some(Self {
            departure,
            destination,
            is_favorite: false,
        })
    }

    /// The list-identity key for this route.
    #[must_use]
    pub fn key(&self) -> RouteKey {
        RouteKey::new(&self.departure.iata_code, &self.destination.iata_code)
    }
}

/// Ordered pair of IATA codes identifying a route.
///
/// Used as the identity for list diffing, per-route favorite subscriptions,
/// and per-route toggle serialization. The pair is ordered: `(JFK, LAX)` and
/// `(LAX, JFK)` are different routes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteKey {
    pub departure_code: String,
    pub destination_code: String,
}

impl RouteKey {
    /// Creates a key from a departure and destination code.
    pub fn new(departure_code: impl Into<String>, destination_code: impl Into<String>) -> Self {
        Self {
            departure_code: departure_code.into(),
            destination_code: destination_code.into(),
        }
    }
}

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.departure_code, self.destination_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn airport(id: i64, code: &str) -> Airport {
        Airport::new(id, code, format!("{code} International"))
    }

    #[test]
    fn route_rejects_matching_codes() {
        let a = airport(1, "JFK");
        assert!(Route::new(a.clone(), a).is_none());
    }

    #[test]
    fn route_starts_provisional() {
        let route = Route::new(airport(1, "JFK"), airport(2, "LAX")).unwrap();
        assert!(!route.is_favorite);
        assert_eq!(route.key(), RouteKey::new("JFK", "LAX"));
    }

    #[test]
    fn key_is_ordered() {
        assert_ne!(RouteKey::new("JFK", "LAX"), RouteKey::new("LAX", "JFK"));
    }
}
