//! Error types for the memory accounting pipeline.
//!
//! Data-level failures (unresolvable pids, dead processes, unmatched
//! renderers) are recovered locally by dropping or zeroing and never show
//! up here. Only precondition violations and configuration problems
//! surface as errors.

use thiserror::Error;

/// Errors returned by [`crate::MemoryDetails::fetch`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The fetch was started from the I/O context. The enumeration stage
    /// itself needs that context, so this is a programming error.
    #[error("fetch must not be called from the I/O context")]
    CalledOnIoContext,

    /// A fetch was already started on this instance. Each instance serves
    /// exactly one request.
    #[error("a fetch is already in flight on this instance")]
    FetchInFlight,
}

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
}
