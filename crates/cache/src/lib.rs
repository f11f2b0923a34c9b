//! Cache of regenerated source files.
//!
//! Files are grouped into partitions, one per binary root, named by the hash
//! of the root's path:
//!
//! ```text
//! gensrc/<CacheKey>/a/b/C.java        source text, read-only
//! gensrc/<CacheKey>/a/b/C.java.attrs  sidecar metadata (JSON)
//! ```
//!
//! A stored file is valid while the sidecar's `origin-hash` equals the
//! [`ContentHash`] of [`FORMAT_VERSION`] and the current class file bytes.
//! Partitions are created on demand and never removed.

mod attributes;
mod cache;
mod cancel;
pub mod error;
mod key;
mod lock;

pub use crate::attributes::{Attributes, SIDECAR_SUFFIX};
pub use crate::cache::{Cached, CachedArtifact, ContentCache, DEFAULT_EXTENSION, Effort, Lookup};
pub use crate::cancel::Cancellation;
pub use crate::key::{CacheKey, ContentHash};

/// Bumped whenever the generation or storage scheme changes; every stored
/// file is regenerated after a bump.
pub const FORMAT_VERSION: [u8; 2] = [0xFF, 0x01];

/// Top-level directory of the cache layout.
pub const GENSRC_DIR: &str = "gensrc";
