//! Logging setup for the crate.
//!
//! All runtime logging goes through the `tracing` macros; this module wires
//! up the subscriber. Embedders that install their own subscriber can skip
//! [`init_tracing`] entirely — the crate only emits events, it never requires
//! its own pipeline.
//!
//! # Configuration
//!
//! Trace level is controlled via:
//! 1. `RUST_LOG` environment variable (highest priority)
//! 2. `trace_level` in [`Config`](crate::Config)
//! 3. Default: `"info"`

mod init;

pub use init::init_tracing;
