//! Cache Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("cache storage error")]
    Storage,
    /// The engine ran but produced no source; nothing was written.
    #[display("regeneration produced no result for {_0}")]
    RegenerationFailed(#[error(not(source))] String),
    /// The engine could not be run.
    #[display("regeneration engine failed")]
    Engine,
    #[display("cancelled")]
    Cancelled,
    /// Not a partition name.
    #[display("invalid cache key: {_0}")]
    InvalidKey(#[error(not(source))] String),
    /// Sidecar metadata is unreadable.
    #[display("invalid cache data")]
    InvalidData,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage | Self::Engine)
    }
}
