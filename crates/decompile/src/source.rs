use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use resrc_classpath::{BinaryName, ClassPath};

/// A nested class file compiled alongside another class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Companion {
    /// Resource name such as `a/b/C$1.class`.
    pub resource: String,
    pub bytes: Vec<u8>,
}

/// Where an engine fetches class files other than the one being regenerated,
/// typically to resolve cross references.
pub trait ClassFileSource {
    /// Bytes of a resource such as `a/b/C.class`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::ClassFileNotFound`] if no root holds the resource.
    fn class_file_content(&self, path: &str) -> Result<Vec<u8>>;

    /// Engines may ask for a path under another name (case-insensitive
    /// filesystems). Resources are never renamed here.
    fn possibly_renamed_path(&self, path: &str) -> String {
        path.to_string()
    }

    /// Nested classes compiled alongside `name` (`a/b/C$1.class`,
    /// `a/b/C$Inner.class`). Names and bytes both come from the root that
    /// owns `name` itself, never from a root earlier on the path.
    fn companions(&self, name: &BinaryName) -> Result<Vec<Companion>>;
}

impl ClassFileSource for ClassPath {
    fn class_file_content(&self, path: &str) -> Result<Vec<u8>> {
        let found = self.find_resource(path).or_raise(|| ErrorKind::ClassPath)?;
        let Some((bytes, _root)) = found else {
            exn::bail!(ErrorKind::ClassFileNotFound(path.to_string()));
        };
        Ok(bytes)
    }

    fn companions(&self, name: &BinaryName) -> Result<Vec<Companion>> {
        let Some(root) = self.find_owner_root(&name.resource_name()).or_raise(|| ErrorKind::ClassPath)? else {
            return Ok(Vec::new());
        };
        let directory = name.package().unwrap_or_default();
        let prefix = match name.package() {
            Some(package) => format!("{package}/{}$", name.simple_name()),
            None => format!("{}$", name.simple_name()),
        };
        let mut companions = Vec::new();
        for resource in root.list(directory).or_raise(|| ErrorKind::ClassPath)? {
            if !resource.starts_with(&prefix) || !resource.ends_with(resrc_classpath::CLASS_SUFFIX) {
                continue;
            }
            // Listed a moment ago; gone now means it was deleted in between.
            let Some(bytes) = root.read(&resource).or_raise(|| ErrorKind::ClassPath)? else {
                continue;
            };
            companions.push(Companion { resource, bytes });
        }
        Ok(companions)
    }
}
