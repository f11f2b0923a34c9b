use crate::attributes::{Attributes, SIDECAR_SUFFIX, sidecar_path};
use crate::error::{ErrorKind, Result};
use crate::lock::LockTable;
use crate::{CacheKey, Cancellation, ContentHash, FORMAT_VERSION, GENSRC_DIR};
use exn::ResultExt;
use resrc_classpath::{BinaryName, BinaryRoot};
use resrc_decompile::{Diagnostic, RegenerationResult};
use resrc_storage::BackendHandle;
use std::path::{Component, Path, PathBuf};
use std::sync::PoisonError;
use tracing::instrument;

/// Default extension of generated files.
pub const DEFAULT_EXTENSION: &str = "java";

/// A generated source file and the metadata stored with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    pub key: CacheKey,
    pub binary_name: BinaryName,
    /// Storage-relative path of the source text.
    pub path: PathBuf,
    pub attributes: Attributes,
}

/// State of a cache slot compared to the current class file bytes.
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup {
    /// Nothing usable is stored for the slot.
    Absent,
    /// Stored hash matches.
    UpToDate(CachedArtifact),
    /// Something is stored, but it was generated from different bytes (or by
    /// a different format version).
    Stale(CachedArtifact),
}

/// How much work it took to produce a [`Cached`] result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effort {
    /// Stored hash matched; the engine did not run.
    Reused,
    /// A stale file was replaced.
    Regenerated,
    /// Nothing was stored yet.
    Generated,
}

/// Result of [`ContentCache::get_or_regenerate`].
#[derive(Debug, Clone)]
pub struct Cached {
    pub artifact: CachedArtifact,
    pub effort: Effort,
    /// Engine diagnostics; empty when the engine did not run.
    pub diagnostics: Vec<Diagnostic>,
}

/// Regenerated sources, stored as `gensrc/<key>/<binary name>.<extension>`
/// with a sidecar holding their [`Attributes`].
///
/// Regeneration of one (partition, binary name) slot is serialized within
/// the process. Generated files are read-only on disk except while being
/// rewritten.
pub struct ContentCache {
    backend: BackendHandle,
    extension: String,
    format_version: Vec<u8>,
    locks: LockTable,
}

impl ContentCache {
    pub fn new(backend: BackendHandle) -> Self {
        Self {
            backend,
            extension: DEFAULT_EXTENSION.to_string(),
            format_version: FORMAT_VERSION.to_vec(),
            locks: LockTable::default(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Override the format version mixed into every [`ContentHash`]. Changing
    /// it invalidates everything stored with the previous one.
    pub fn with_format_version(mut self, version: impl Into<Vec<u8>>) -> Self {
        self.format_version = version.into();
        self
    }

    pub fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn content_hash(&self, bytes: &[u8]) -> ContentHash {
        ContentHash::compute(&self.format_version, bytes)
    }

    /// Storage-relative path of the generated file for a slot.
    pub fn source_path(&self, key: &CacheKey, name: &BinaryName) -> PathBuf {
        key.partition_path().join(name.source_path(&self.extension))
    }

    /// Where the generated file lives on the local filesystem, if the backend
    /// has one.
    pub fn local_path(&self, artifact: &CachedArtifact) -> Option<PathBuf> {
        self.backend.local_path(&artifact.path)
    }

    /// Stored artifact for a slot, from persisted metadata only.
    ///
    /// A source file without a readable sidecar was not completely written
    /// and counts as absent.
    pub fn lookup(&self, key: &CacheKey, name: &BinaryName) -> Result<Option<CachedArtifact>> {
        let path = self.source_path(key, name);
        if !self.backend.exists(&path).or_raise(|| ErrorKind::Storage)? {
            return Ok(None);
        }
        let Some(attributes) = self.read_attributes(&path)? else {
            return Ok(None);
        };
        Ok(Some(CachedArtifact {
            key: key.clone(),
            binary_name: name.clone(),
            path,
            attributes,
        }))
    }

    /// Compare a slot against `hash`.
    pub fn check(&self, key: &CacheKey, name: &BinaryName, hash: &ContentHash) -> Result<Lookup> {
        Ok(match self.lookup(key, name)? {
            None => Lookup::Absent,
            Some(artifact) if &artifact.attributes.origin_hash == hash => Lookup::UpToDate(artifact),
            Some(artifact) => Lookup::Stale(artifact),
        })
    }

    /// Return the stored artifact if it was generated from `bytes`, otherwise
    /// run `regenerate` and store its first result.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::RegenerationFailed`] if `regenerate` produced no source.
    ///   Whatever was stored before is left as it was.
    /// - [`ErrorKind::Cancelled`] if `cancel` fired before the write started.
    /// - [`ErrorKind::Storage`] for storage failures.
    #[instrument(skip_all, fields(key = %key, name = %name, effort))]
    pub fn get_or_regenerate<F>(
        &self,
        key: &CacheKey,
        name: &BinaryName,
        root: &BinaryRoot,
        bytes: &[u8],
        cancel: &Cancellation,
        regenerate: F,
    ) -> Result<Cached>
    where
        F: FnOnce(&[u8], &BinaryName) -> Result<RegenerationResult>,
    {
        let lock = self.locks.get(key, name);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        cancel.check()?;

        let hash = self.content_hash(bytes);
        let effort = match self.check(key, name, &hash)? {
            Lookup::UpToDate(artifact) => {
                tracing::debug!(path = %artifact.path.display(), "Up to date, reusing from cache");
                tracing::Span::current().record("effort", "reused");
                return Ok(Cached {
                    artifact,
                    effort: Effort::Reused,
                    diagnostics: Vec::new(),
                });
            },
            Lookup::Stale(artifact) => {
                tracing::debug!(path = %artifact.path.display(), "Not up to date, regenerating");
                Effort::Regenerated
            },
            Lookup::Absent => {
                tracing::debug!(path = %self.source_path(key, name).display(), "Does not exist, creating");
                Effort::Generated
            },
        };

        let result = regenerate(bytes, name)?;
        let diagnostics = result.diagnostics.clone();
        let Some(primary) = result.into_primary() else {
            tracing::warn!(diagnostics = diagnostics.len(), "Regeneration produced no result");
            exn::bail!(ErrorKind::RegenerationFailed(name.to_string()));
        };
        cancel.check()?;

        let attributes = Attributes {
            origin_hash: hash,
            disable_java_errors: true,
            classfile_root: root.url().or_raise(|| ErrorKind::InvalidData)?,
            classfile_binary_name: name.to_string(),
        };
        let path = self.source_path(key, name);
        self.persist(&path, primary.java.as_bytes(), &attributes)?;
        tracing::Span::current().record("effort", if effort == Effort::Generated { "generated" } else { "regenerated" });
        Ok(Cached {
            artifact: CachedArtifact {
                key: key.clone(),
                binary_name: name.clone(),
                path,
                attributes,
            },
            effort,
            diagnostics,
        })
    }

    pub fn read_text(&self, artifact: &CachedArtifact) -> Result<String> {
        let bytes = self.backend.read(&artifact.path).or_raise(|| ErrorKind::Storage)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Artifact stored at a storage-relative `path` (`gensrc/<key>/a/b/C.java`),
    /// reconstructed from its sidecar. `None` for paths outside the cache
    /// layout and for files without metadata.
    pub fn artifact_at(&self, path: &Path) -> Result<Option<CachedArtifact>> {
        let Some(key) = partition_of(path) else {
            return Ok(None);
        };
        if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
            return Ok(None);
        }
        let Some(attributes) = self.read_attributes(path)? else {
            return Ok(None);
        };
        let Ok(binary_name) = BinaryName::parse(&attributes.classfile_binary_name) else {
            tracing::warn!(path = %path.display(), "Cached file records an invalid binary name");
            return Ok(None);
        };
        Ok(Some(CachedArtifact {
            key,
            binary_name,
            path: path.to_path_buf(),
            attributes,
        }))
    }

    /// Every complete artifact, or only those of one partition.
    pub fn list(&self, partition: Option<&CacheKey>) -> Result<Vec<CachedArtifact>> {
        let prefix = partition.map(CacheKey::partition_path).unwrap_or_else(|| PathBuf::from(GENSRC_DIR));
        let files = self.backend.list(Some(&prefix)).or_raise(|| ErrorKind::Storage)?;
        let mut artifacts = Vec::new();
        for file in files {
            if file.path.to_string_lossy().ends_with(SIDECAR_SUFFIX) {
                continue;
            }
            if let Some(artifact) = self.artifact_at(&file.path)? {
                artifacts.push(artifact);
            }
        }
        Ok(artifacts)
    }

    fn read_attributes(&self, path: &Path) -> Result<Option<Attributes>> {
        let sidecar = sidecar_path(path);
        let bytes = match self.backend.read(&sidecar) {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e).or_raise(|| ErrorKind::Storage),
        };
        match Attributes::from_json(&bytes) {
            Ok(attributes) => Ok(Some(attributes)),
            Err(e) => {
                tracing::warn!(path = %sidecar.display(), error = ?e, "Ignoring unreadable cache metadata");
                Ok(None)
            },
        }
    }

    // The sidecar goes first and comes back last: until it exists again the
    // slot reads as absent, whatever state the source file is in.
    fn persist(&self, path: &Path, text: &[u8], attributes: &Attributes) -> Result<()> {
        let sidecar = sidecar_path(path);
        match self.backend.delete(&sidecar) {
            Err(e) if !e.is_not_found() => return Err(e).or_raise(|| ErrorKind::Storage),
            _ => {},
        }
        match self.backend.set_readonly(path, false) {
            Err(e) if !e.is_not_found() => return Err(e).or_raise(|| ErrorKind::Storage),
            _ => {},
        }
        self.backend.write(path, text).or_raise(|| ErrorKind::Storage)?;
        self.backend.set_readonly(path, true).or_raise(|| ErrorKind::Storage)?;
        self.backend.write(&sidecar, &attributes.to_json()?).or_raise(|| ErrorKind::Storage)?;
        tracing::debug!(backend = self.backend.name(), path = %path.display(), bytes = text.len(), "Generated source stored");
        Ok(())
    }
}

fn partition_of(path: &Path) -> Option<CacheKey> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(dir)) if dir == GENSRC_DIR => {},
        _ => return None,
    }
    let Some(Component::Normal(key)) = components.next() else {
        return None;
    };
    CacheKey::parse(key.to_str()?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use resrc_decompile::{Decompiled, Severity};
    use resrc_storage::backend::{LocalBackend, MockBackend};
    use resrc_storage::StorageBackend;
    use std::cell::Cell;
    use std::sync::Arc;

    fn root() -> BinaryRoot {
        BinaryRoot::Directory("/project/classes".into())
    }

    fn source(text: &str) -> RegenerationResult {
        RegenerationResult {
            sources: vec![Decompiled::text(text)],
            diagnostics: Vec::new(),
        }
    }

    fn mock_cache() -> (Arc<MockBackend>, ContentCache) {
        let backend = Arc::new(MockBackend::default());
        let cache = ContentCache::new(backend.clone());
        (backend, cache)
    }

    #[test]
    fn test_generate_then_reuse() {
        let (backend, cache) = mock_cache();
        let key = CacheKey::for_root(&root());
        let name = BinaryName::parse("a.Foo").unwrap();
        let calls = Cell::new(0);
        let regenerate = |_: &[u8], _: &BinaryName| {
            calls.set(calls.get() + 1);
            Ok(source("class Foo {}"))
        };

        let first = cache.get_or_regenerate(&key, &name, &root(), b"v1", &Cancellation::new(), regenerate).unwrap();
        assert_eq!(first.effort, Effort::Generated);
        assert_eq!(first.artifact.path, Path::new("gensrc").join(key.as_str()).join("a/Foo.java"));
        assert_eq!(first.artifact.attributes.origin_hash, ContentHash::compute(&FORMAT_VERSION, b"v1"));
        assert!(first.artifact.attributes.disable_java_errors);
        assert_eq!(first.artifact.attributes.classfile_binary_name, "a/Foo");
        assert_eq!(first.artifact.attributes.classfile_root.as_str(), "file:///project/classes/");
        let writes = backend.writes();

        let second = cache.get_or_regenerate(&key, &name, &root(), b"v1", &Cancellation::new(), regenerate).unwrap();
        assert_eq!(second.effort, Effort::Reused);
        assert_eq!(second.artifact, first.artifact);
        assert_eq!(calls.get(), 1);
        assert_eq!(backend.writes(), writes);
        assert_eq!(cache.read_text(&second.artifact).unwrap(), "class Foo {}");
    }

    #[test]
    fn test_changed_bytes_regenerate() {
        let (_backend, cache) = mock_cache();
        let key = CacheKey::for_root(&root());
        let name = BinaryName::parse("a.Foo").unwrap();
        let first = cache
            .get_or_regenerate(&key, &name, &root(), b"v1", &Cancellation::new(), |_, _| Ok(source("one")))
            .unwrap();
        let second = cache
            .get_or_regenerate(&key, &name, &root(), b"v2", &Cancellation::new(), |_, _| Ok(source("two")))
            .unwrap();
        assert_eq!(second.effort, Effort::Regenerated);
        assert_ne!(first.artifact.attributes.origin_hash, second.artifact.attributes.origin_hash);
        assert_eq!(first.artifact.path, second.artifact.path);
        assert_eq!(cache.read_text(&second.artifact).unwrap(), "two");
    }

    #[test]
    fn test_no_result_leaves_previous_artifact() {
        let (backend, cache) = mock_cache();
        let key = CacheKey::for_root(&root());
        let name = BinaryName::parse("a.Foo").unwrap();
        let first = cache
            .get_or_regenerate(&key, &name, &root(), b"v1", &Cancellation::new(), |_, _| Ok(source("one")))
            .unwrap();
        let writes = backend.writes();
        let failed = RegenerationResult {
            sources: Vec::new(),
            diagnostics: vec![Diagnostic {
                severity: Severity::Warning,
                message: "bad class file".to_string(),
            }],
        };
        let err = cache
            .get_or_regenerate(&key, &name, &root(), b"v2", &Cancellation::new(), |_, _| Ok(failed))
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::RegenerationFailed(_)));
        assert_eq!(backend.writes(), writes);
        assert_eq!(cache.lookup(&key, &name).unwrap(), Some(first.artifact));
    }

    #[test]
    fn test_no_result_writes_nothing() {
        let (backend, cache) = mock_cache();
        let key = CacheKey::for_root(&root());
        let name = BinaryName::parse("a.Foo").unwrap();
        let err = cache
            .get_or_regenerate(&key, &name, &root(), b"v1", &Cancellation::new(), |_, _| Ok(RegenerationResult::default()))
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::RegenerationFailed(_)));
        assert_eq!(backend.writes(), 0);
        assert!(cache.lookup(&key, &name).unwrap().is_none());
    }

    #[test]
    fn test_first_of_many_results_is_kept() {
        let (_backend, cache) = mock_cache();
        let key = CacheKey::for_root(&root());
        let name = BinaryName::parse("a.Foo").unwrap();
        let result = RegenerationResult {
            sources: vec![Decompiled::text("first"), Decompiled::text("second")],
            diagnostics: Vec::new(),
        };
        let cached = cache
            .get_or_regenerate(&key, &name, &root(), b"v1", &Cancellation::new(), |_, _| Ok(result))
            .unwrap();
        assert_eq!(cache.read_text(&cached.artifact).unwrap(), "first");
    }

    #[test]
    fn test_cancelled_before_write() {
        let (backend, cache) = mock_cache();
        let key = CacheKey::for_root(&root());
        let name = BinaryName::parse("a.Foo").unwrap();
        let cancel = Cancellation::new();
        let err = cache
            .get_or_regenerate(&key, &name, &root(), b"v1", &cancel, |_, _| {
                cancel.cancel();
                Ok(source("late"))
            })
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::Cancelled));
        assert_eq!(backend.writes(), 0);

        let calls = Cell::new(0);
        let err = cache
            .get_or_regenerate(&key, &name, &root(), b"v1", &cancel, |_, _| {
                calls.set(calls.get() + 1);
                Ok(source("never"))
            })
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::Cancelled));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_format_version_bump_invalidates() {
        let backend = Arc::new(MockBackend::default());
        let key = CacheKey::for_root(&root());
        let name = BinaryName::parse("a.Foo").unwrap();
        let old = ContentCache::new(backend.clone()).with_format_version([0xFF, 0x00]);
        old.get_or_regenerate(&key, &name, &root(), b"v1", &Cancellation::new(), |_, _| Ok(source("old")))
            .unwrap();
        let new = ContentCache::new(backend.clone());
        let hash = new.content_hash(b"v1");
        assert!(matches!(new.check(&key, &name, &hash).unwrap(), Lookup::Stale(_)));
        let cached = new
            .get_or_regenerate(&key, &name, &root(), b"v1", &Cancellation::new(), |_, _| Ok(source("new")))
            .unwrap();
        assert_eq!(cached.effort, Effort::Regenerated);
        assert_eq!(new.read_text(&cached.artifact).unwrap(), "new");
    }

    #[test]
    fn test_text_without_sidecar_is_absent() {
        let backend = Arc::new(MockBackend::default());
        let cache = ContentCache::new(backend.clone());
        let key = CacheKey::for_root(&root());
        let name = BinaryName::parse("a.Foo").unwrap();
        backend.write(&cache.source_path(&key, &name), b"half written").unwrap();
        assert!(cache.lookup(&key, &name).unwrap().is_none());
        backend.write(&sidecar_path(&cache.source_path(&key, &name)), b"not json").unwrap();
        assert!(cache.lookup(&key, &name).unwrap().is_none());
        let cached = cache
            .get_or_regenerate(&key, &name, &root(), b"v1", &Cancellation::new(), |_, _| Ok(source("whole")))
            .unwrap();
        assert_eq!(cached.effort, Effort::Generated);
    }

    #[test]
    fn test_storage_failure_surfaces() {
        let (backend, cache) = mock_cache();
        backend.fail_writes(true);
        let key = CacheKey::for_root(&root());
        let name = BinaryName::parse("a.Foo").unwrap();
        let err = cache
            .get_or_regenerate(&key, &name, &root(), b"v1", &Cancellation::new(), |_, _| Ok(source("x")))
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::Storage));
        assert!(cache.lookup(&key, &name).unwrap().is_none());
    }

    #[test]
    fn test_partitions_are_isolated() {
        let (_backend, cache) = mock_cache();
        let one = BinaryRoot::Directory("/one".into());
        let two = BinaryRoot::Archive("/two.jar".into());
        let name = BinaryName::parse("a.Foo").unwrap();
        let first = cache
            .get_or_regenerate(&CacheKey::for_root(&one), &name, &one, b"1", &Cancellation::new(), |_, _| Ok(source("1")))
            .unwrap();
        let second = cache
            .get_or_regenerate(&CacheKey::for_root(&two), &name, &two, b"2", &Cancellation::new(), |_, _| Ok(source("2")))
            .unwrap();
        assert_ne!(first.artifact.path, second.artifact.path);
        assert_eq!(cache.read_text(&first.artifact).unwrap(), "1");
        assert_eq!(cache.read_text(&second.artifact).unwrap(), "2");
        assert_eq!(cache.list(None).unwrap().len(), 2);
        assert_eq!(cache.list(Some(&CacheKey::for_root(&two))).unwrap(), vec![second.artifact]);
    }

    #[test]
    fn test_artifact_at() {
        let (_backend, cache) = mock_cache();
        let key = CacheKey::for_root(&root());
        let name = BinaryName::parse("a.Foo").unwrap();
        let cached = cache
            .get_or_regenerate(&key, &name, &root(), b"v1", &Cancellation::new(), |_, _| Ok(source("x")))
            .unwrap();
        assert_eq!(cache.artifact_at(&cached.artifact.path).unwrap(), Some(cached.artifact.clone()));
        assert!(cache.artifact_at(Path::new("elsewhere/a/Foo.java")).unwrap().is_none());
        assert!(cache.artifact_at(&sidecar_path(&cached.artifact.path)).unwrap().is_none());
    }

    #[test]
    fn test_local_files_are_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(LocalBackend::new("cache", dir.path()).unwrap());
        let cache = ContentCache::new(backend.clone());
        let key = CacheKey::for_root(&root());
        let name = BinaryName::parse("a.Foo").unwrap();
        let first = cache
            .get_or_regenerate(&key, &name, &root(), b"v1", &Cancellation::new(), |_, _| Ok(source("one")))
            .unwrap();
        let local = cache.local_path(&first.artifact).unwrap();
        assert_eq!(local, dir.path().join(&first.artifact.path));
        assert!(std::fs::metadata(&local).unwrap().permissions().readonly());

        // Read-only files are still replaced on regeneration.
        let second = cache
            .get_or_regenerate(&key, &name, &root(), b"v2", &Cancellation::new(), |_, _| Ok(source("two")))
            .unwrap();
        assert_eq!(std::fs::read_to_string(&local).unwrap(), "two");
        assert!(std::fs::metadata(&local).unwrap().permissions().readonly());
        assert_eq!(second.effort, Effort::Regenerated);
    }

    #[test]
    fn test_concurrent_requests_regenerate_once() {
        let (_backend, cache) = mock_cache();
        let cache = Arc::new(cache);
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                std::thread::spawn(move || {
                    let key = CacheKey::for_root(&root());
                    let name = BinaryName::parse("a.Foo").unwrap();
                    cache
                        .get_or_regenerate(&key, &name, &root(), b"v1", &Cancellation::new(), |_, _| {
                            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                            std::thread::sleep(std::time::Duration::from_millis(10));
                            Ok(source("class Foo {}"))
                        })
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
