//! Storage backend trait and implementations.
//!
//! The cache layout (`gensrc/<partition>/<binary name>.java` plus sidecar
//! files) is written through [`StorageBackend`]; the local filesystem is the
//! only production implementation, the in-memory one exists for tests.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use crate::models::FileInfo;
use std::path::{Path, PathBuf};

/// Unified interface for storage backends.
///
/// All operations are blocking. A regeneration request is one synchronous
/// unit of work on the caller's thread, and storage is part of it.
///
/// # Path Handling
/// All paths are relative to the storage root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations
/// enforce this validation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use resrc_storage::{StorageBackend, error::Result};
///
/// fn cached_text(backend: &dyn StorageBackend) -> Result<Option<String>> {
///     let path = Path::new("gensrc/0f3a/java/lang/String.java");
///     if !backend.exists(path)? {
///         return Ok(None);
///     }
///     let bytes = backend.read(path)?;
///     Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
/// }
/// ```
pub trait StorageBackend: Send + Sync {
    /// Name of the backend, used for logging only.
    fn name(&self) -> &str;

    /// Where a stored file lives on the local filesystem, for backends that
    /// have such a thing. This is what gets handed to whoever opens the
    /// generated source in an editor.
    fn local_path(&self, path: &Path) -> Option<PathBuf>;

    /// List all files whose path starts with an optional prefix.
    ///
    /// Prefix matching is component-based: `gensrc/ab` does not match
    /// `gensrc/abc/Foo.java`. A prefix that does not exist yields an empty
    /// list, not an error.
    fn list(&self, prefix: Option<&Path>) -> Result<Vec<FileInfo>>;

    /// Check if a file exists.
    fn exists(&self, path: &Path) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents, replacing any existing file.
    ///
    /// # Notes
    /// - Parent directories are created as needed.
    /// - The write is all-or-nothing: readers observe either the old
    ///   contents or the new contents, never a truncated file.
    /// - Writing over a file marked read-only fails with
    ///   [`PermissionDenied`](crate::error::ErrorKind::PermissionDenied);
    ///   clear the flag with [`set_readonly`](Self::set_readonly) first.
    fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Delete a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    fn delete(&self, path: &Path) -> Result<()>;

    /// Protect (or unprotect) a file against writes.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    fn set_readonly(&self, path: &Path, readonly: bool) -> Result<()>;
}
