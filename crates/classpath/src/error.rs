//! Class path Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No root on the class path holds the resource.
    #[display("cannot find resource on class path: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Not a well-formed binary name.
    #[display("invalid binary name: {_0}")]
    InvalidName(#[error(not(source))] String),
    /// Symbol reference could not be parsed.
    #[display("invalid symbol reference: {_0}")]
    InvalidSymbol(#[error(not(source))] String),
    /// The symbol does not map to a single compiled unit (packages).
    #[display("symbol cannot be regenerated: {_0}")]
    UnsupportedSymbol(#[error(not(source))] String),
    /// Root path is not usable (relative, or not representable as a URL).
    #[display("invalid binary root: {}", _0.display())]
    InvalidRoot(#[error(not(source))] PathBuf),
    /// Reading from a root failed.
    #[display("failed to read from {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// Archive is corrupt or not a zip file.
    #[display("unreadable archive: {}", _0.display())]
    Archive(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
