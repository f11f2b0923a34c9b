//! Generation Error Types
//!
//! None of these escape [`SourceGenerator::generate`](crate::SourceGenerator::generate):
//! every failure there is logged and reported as "nothing generated".

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The symbol has no compiled unit of its own, e.g. a package.
    #[display("{_0} cannot be regenerated")]
    UnsupportedSymbolKind(#[error(not(source))] String),
    /// No root on the class path holds the class file.
    #[display("{_0} not found on the class path")]
    ArtifactNotFound(#[error(not(source))] String),
    /// The engine ran (or failed to start) without producing source.
    #[display("no source produced for {_0}")]
    EngineProducedNoResult(#[error(not(source))] String),
    /// Reading class files or reading/writing the cache failed.
    #[display("storage failure")]
    StorageFailure,
    #[display("cancelled")]
    Cancelled,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageFailure)
    }
}
