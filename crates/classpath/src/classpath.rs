use crate::error::{Error, ErrorKind, Result};
use crate::{BinaryName, BinaryRoot};
use std::fmt;

/// Ordered search path of binary roots. Earlier roots shadow later ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassPath {
    roots: Vec<BinaryRoot>,
}

/// Bytes of one class file, and the root they were read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBytes {
    pub name: BinaryName,
    pub bytes: Vec<u8>,
    pub root: BinaryRoot,
}

impl ClassPath {
    pub fn new(roots: impl IntoIterator<Item = BinaryRoot>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
        }
    }

    /// Compose the search path from its three kinds. Compiled output goes
    /// first so that a project's own classes shadow the platform, and sources
    /// come last.
    pub fn from_kinds(
        compile: impl IntoIterator<Item = BinaryRoot>,
        boot: impl IntoIterator<Item = BinaryRoot>,
        source: impl IntoIterator<Item = BinaryRoot>,
    ) -> Self {
        Self::new(compile.into_iter().chain(boot).chain(source))
    }

    pub fn roots(&self) -> &[BinaryRoot] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Bytes of the first occurrence of `resource` (e.g. `a/b/C.class`) along
    /// the path.
    ///
    /// Roots that cannot be read are skipped. Their first error is returned
    /// only when no later root holds the resource.
    pub fn find_resource(&self, resource: &str) -> Result<Option<(Vec<u8>, &BinaryRoot)>> {
        let mut failure = None;
        for root in &self.roots {
            match root.read(resource) {
                Ok(Some(bytes)) => return Ok(Some((bytes, root))),
                Ok(None) => {},
                Err(e) => skip_root(root, resource, e, &mut failure),
            }
        }
        failure.map_or(Ok(None), Err)
    }

    /// The root that owns the first occurrence of `resource`. Unreadable roots
    /// are skipped as in [`find_resource`](Self::find_resource).
    pub fn find_owner_root(&self, resource: &str) -> Result<Option<&BinaryRoot>> {
        let mut failure = None;
        for root in &self.roots {
            match root.contains(resource) {
                Ok(true) => return Ok(Some(root)),
                Ok(false) => {},
                Err(e) => skip_root(root, resource, e, &mut failure),
            }
        }
        failure.map_or(Ok(None), Err)
    }

    /// Find the class file for `name`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotFound`] when no root holds it. A root that cannot be
    /// read only fails the lookup if no root after it holds the class.
    #[tracing::instrument(level = "debug", skip(self), fields(name = %name))]
    pub fn locate(&self, name: &BinaryName) -> Result<ResourceBytes> {
        let resource = name.resource_name();
        let Some((bytes, root)) = self.find_resource(&resource)? else {
            tracing::info!(resource = %resource, classpath = %self, "Cannot find resource on class path");
            exn::bail!(ErrorKind::NotFound(resource));
        };
        tracing::debug!(resource = %resource, root = %root, bytes = bytes.len(), "Located class file");
        Ok(ResourceBytes {
            name: name.clone(),
            bytes,
            root: root.clone(),
        })
    }
}

fn skip_root(root: &BinaryRoot, resource: &str, error: Error, failure: &mut Option<Error>) {
    tracing::warn!(root = %root, resource = %resource, error = ?error, "Skipping unreadable class path root");
    failure.get_or_insert(error);
}

impl fmt::Display for ClassPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, root) in self.roots.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{root}")?;
        }
        Ok(())
    }
}

impl FromIterator<BinaryRoot> for ClassPath {
    fn from_iter<T: IntoIterator<Item = BinaryRoot>>(iter: T) -> Self {
        Self::new(iter)
    }
}
