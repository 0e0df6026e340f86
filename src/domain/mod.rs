//! Core domain types shared across the crate.
//!
//! # Modules
//!
//! - [`airport`]: immutable airport reference data
//! - [`route`]: departure/destination pairs and their list identity
//! - [`error`]: centralized error type and `Result` alias

pub mod airport;
pub mod error;
pub mod route;

pub use airport::Airport;
pub use error::{FlightSearchError, Result};
pub use route::{Route, RouteKey};
