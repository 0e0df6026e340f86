//! JSON-seeded in-memory airport catalog.
//!
//! The airport table is reference data: loaded once at startup from a JSON seed
//! file, held in memory behind a watch sender, and served to queries as derived
//! live views. Queries are cheap snapshots over a table of at most a few
//! thousand rows; no index is kept.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::watch;

use crate::domain::error::{FlightSearchError, Result};
use crate::domain::Airport;
use crate::live::{self, Live};

/// Seed file format.
///
/// ```json
/// {
///   "airports": [
///     { "id": 1, "iata_code": "JFK", "name": "John F. Kennedy International Airport" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SeedFile {
    airports: Vec<Airport>,
}

/// In-memory airport catalog seeded from a JSON file.
///
/// The table never changes after load in the current backend, but queries are
/// still served as [`Live`] views derived from the table's watch channel, so
/// the contract (re-emit on change) holds if a mutable backend ever replaces
/// this one.
pub struct JsonCatalog {
    table: watch::Sender<Vec<Airport>>,
}

impl JsonCatalog {
    /// Loads the catalog from a JSON seed file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid JSON, or
    /// contains duplicate IATA codes. A broken seed is fatal at startup; there
    /// is no degraded mode without reference data.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = ?path, "loading airport catalog seed");

        let contents = tokio::fs::read_to_string(path).await?;
        let seed: SeedFile = serde_json::from_str(&contents)
            .map_err(|e| FlightSearchError::Catalog(format!("failed to parse seed: {e}")))?;

        Self::from_airports(seed.airports)
    }

    /// Builds a catalog from an already-loaded airport table.
    ///
    /// # Errors
    ///
    /// Returns an error if two airports share an IATA code.
    pub fn from_airports(airports: Vec<Airport>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for airport in &airports {
            if !seen.insert(airport.iata_code.clone()) {
                return Err(FlightSearchError::Catalog(format!(
                    "duplicate IATA code in seed: {}",
                    airport.iata_code
                )));
            }
        }

        tracing::debug!(airport_count = airports.len(), "catalog initialized");

        let (table, _) = watch::channel(airports);
        Ok(Self { table })
    }
}

#[async_trait::async_trait]
impl super::AirportCatalog for JsonCatalog {
    async fn search(&self, fragment: &str) -> Result<Live<Vec<Airport>>> {
        let _span = tracing::debug_span!("catalog_search", fragment = %fragment).entered();

        let needle = fragment.to_string();
        let results = live::derive(self.table.subscribe(), move |table: &Vec<Airport>| {
            table
                .iter()
                .filter(|airport| airport.matches(&needle))
                .cloned()
                .collect::<Vec<Airport>>()
        });

        tracing::debug!(match_count = results.borrow().len(), "search query derived");
        Ok(results)
    }

    async fn by_code(&self, code: &str) -> Result<Option<Airport>> {
        let airport = self
            .table
            .borrow()
            .iter()
            .find(|a| a.iata_code == code)
            .cloned();

        tracing::trace!(code = %code, found = airport.is_some(), "airport lookup");
        Ok(airport)
    }

    async fn destinations_from(&self, code: &str) -> Result<Live<Vec<Airport>>> {
        let _span = tracing::debug_span!("catalog_destinations", code = %code).entered();

        let origin = code.to_string();
        Ok(live::derive(
            self.table.subscribe(),
            move |table: &Vec<Airport>| {
                table
                    .iter()
                    .filter(|airport| airport.iata_code != origin)
                    .cloned()
                    .collect()
            },
        ))
    }
}
