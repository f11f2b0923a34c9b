//! Storage for regenerated sources.
//!
//! The cache never touches the filesystem directly; everything goes through a
//! [`StorageBackend`] so that the on-disk layout can be swapped out (or faked
//! entirely in tests with the `mock` feature).

pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::models::FileInfo;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
