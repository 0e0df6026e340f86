//! Error types for the flight search core.
//!
//! This module defines the centralized error type [`FlightSearchError`] and a type
//! alias [`Result`] for convenient error handling throughout the crate. All errors
//! are implemented using the `thiserror` crate for automatic `Error` trait
//! implementation.
//!
//! Propagation policy: catalog and store failures are absorbed at the producer
//! boundary (logged, degraded to an empty emission); only failures during
//! [`initialize`](crate::initialize) are allowed to abort the session.

use thiserror::Error;

/// The main error type for flight search operations.
///
/// This enum consolidates all error conditions that can occur in the core, from
/// catalog lookups to persistence failures and configuration issues. Most variants
/// wrap underlying errors from external crates using `#[from]` for automatic
/// conversion.
#[derive(Debug, Error)]
pub enum FlightSearchError {
    /// Airport catalog lookup failed.
    ///
    /// Occurs when a search, point lookup, or destination query against the
    /// catalog cannot be served. Consumers treat this as an empty result set.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Favorite store operation failed.
    ///
    /// Occurs when reading from or writing to the favorites backend fails.
    /// The string contains a description of what went wrong.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem or I/O operation failed.
    ///
    /// Wraps errors from standard library and tokio I/O operations. Automatically
    /// converts from `std::io::Error` using the `#[from]` attribute.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is invalid or missing.
    ///
    /// Occurs when required configuration values are missing or malformed.
    /// The string describes the specific configuration problem.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A specialized `Result` type for flight search operations.
///
/// This is a type alias for `std::result::Result<T, FlightSearchError>` that
/// simplifies function signatures throughout the codebase.
pub type Result<T> = std::result::Result<T, FlightSearchError>;
