//! Airport catalog abstraction.
//!
//! This module defines the [`AirportCatalog`] trait that abstracts over airport
//! lookup backends. The trait is minimal and focused on the three queries the
//! core actually issues, not a generic data-access layer. Every multi-row query
//! returns a [`Live`] sequence so a subscribed view refreshes if the underlying
//! table ever changes (not expected in practice, but the contract allows it).
//!
//! # Implementations
//!
//! - [`JsonCatalog`]: in-memory table seeded from a JSON file (default)

pub mod json;

pub use json::JsonCatalog;

use async_trait::async_trait;

use crate::domain::error::Result;
use crate::domain::Airport;
use crate::live::Live;

/// Abstraction over airport lookup backends.
///
/// All queries are read-only. Failures surface as
/// [`FlightSearchError::Catalog`](crate::domain::FlightSearchError::Catalog)
/// and are absorbed by callers into empty result sets; a catalog error never
/// crashes a consumer.
#[async_trait]
pub trait AirportCatalog: Send + Sync {
    /// Searches airports whose code or name contains `fragment`, case-insensitively.
    ///
    /// Callers never pass a blank fragment; blank input is filtered upstream and
    /// routes the view to favorites instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be served.
    async fn search(&self, fragment: &str) -> Result<Live<Vec<Airport>>>;

    /// Point lookup by IATA code.
    ///
    /// An absent code yields `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup cannot be served.
    async fn by_code(&self, code: &str) -> Result<Option<Airport>>;

    /// All airports except `code` itself.
    ///
    /// Every pair of distinct known airports is a valid route in this domain,
    /// so the destination set is simply the rest of the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be served.
    async fn destinations_from(&self, code: &str) -> Result<Live<Vec<Airport>>>;
}
