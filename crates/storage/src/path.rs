//! Path validation for storage-relative paths.
//!
//! Binary names come from class files and symbol references we don't
//! control, and they end up as paths inside the cache directory. Everything
//! must stay inside the backend root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a storage-relative path.
///
/// `.` components and repeated separators are dropped, `..` is resolved
/// lexically and rejected if it would climb above the root. Null bytes,
/// Windows prefixes and paths that normalize to nothing are rejected.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use resrc_storage::validate_path;
/// assert!(validate_path("gensrc/0a1b/java/lang/String.java").is_ok());
/// assert!(validate_path("gensrc/../gensrc/Foo.java").is_ok());
/// assert!(validate_path("../outside.java").is_err());
/// assert!(validate_path("gensrc/../../outside.java").is_err());
/// assert!(validate_path("Foo\0.java").is_err());
/// assert_eq!(
///     validate_path("/gensrc/./abc//a/b/C.java").unwrap(),
///     Path::new("gensrc/abc/a/b/C.java")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(path.to_path_buf());
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes survive Path::components() on Unix but truncate
                // the path once it reaches a syscall.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(invalid());
    }
    Ok(components.into_iter().collect())
}
