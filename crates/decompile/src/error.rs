//! Decompiler Error Types
//!
//! Engine diagnostics are not errors, they end up in the
//! [`ResultCollector`](crate::ResultCollector). These are the failures that
//! stop an engine from running at all.

use derive_more::{Display, Error};

/// A decompiler error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for decompiler operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The engine executable is not installed (or not on `PATH`).
    #[display("decompiler not found: {_0}")]
    ProgramNotFound(#[error(not(source))] String),
    /// The engine asked for a class file the class path doesn't have.
    #[display("class file not found: {_0}")]
    ClassFileNotFound(#[error(not(source))] String),
    /// Reading from the class path failed.
    #[display("class path lookup failed")]
    ClassPath,
    /// Preparing or running the engine process failed.
    #[display("failed to run decompiler {_0}")]
    Spawn(#[error(not(source))] String),
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io | Self::ClassPath)
    }
}
