//! In-memory storage backend for testing.

use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::models::FileInfo;
use crate::path::validate as validate_path;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use time::OffsetDateTime;

#[derive(Clone)]
struct MockFile {
    modified: OffsetDateTime,
    data: Vec<u8>,
    readonly: bool,
}

/// In-memory storage backend for testing.
///
/// Files are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Successful writes
/// are counted, which lets tests assert that a cache hit did not touch
/// storage.
///
/// # Examples
///
/// ```
/// use resrc_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([
///     ("gensrc/abc/Foo.java", b"class Foo {}"),
/// ]);
/// assert!(backend.exists(Path::new("gensrc/abc/Foo.java"))?);
///
/// backend.write(Path::new("gensrc/abc/Bar.java"), b"class Bar {}")?;
/// assert_eq!(backend.writes(), 1);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<HashMap<PathBuf, MockFile>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = HashMap::new();
        let now = OffsetDateTime::now_utc();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            map.insert(
                validated,
                MockFile {
                    modified: now,
                    data: data.into(),
                    readonly: false,
                },
            );
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
            writes: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Change the name of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of successful writes since creation.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent write fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    // A panicking test thread must not take every other test down with it.
    fn read_guard(&self) -> RwLockReadGuard<'_, HashMap<PathBuf, MockFile>> {
        self.storage.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, HashMap<PathBuf, MockFile>> {
        self.storage.write().unwrap_or_else(PoisonError::into_inner)
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn local_path(&self, _path: &Path) -> Option<PathBuf> {
        None
    }

    fn list(&self, prefix: Option<&Path>) -> Result<Vec<FileInfo>> {
        let prefix = prefix.map(validate_path).transpose()?;
        let guard = self.read_guard();
        let mut files: Vec<FileInfo> = guard
            .iter()
            .filter(|(path, _)| match &prefix {
                Some(pfx) => path.starts_with(pfx),
                None => true,
            })
            .map(|(path, file)| FileInfo::new(path.clone(), file.data.len() as u64, file.modified, file.readonly))
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        Ok(self.read_guard().contains_key(&path))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let file = self.read_guard().get(&path).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))?;
        Ok(file.data)
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::BackendError(format!("write to {} refused", path.display())));
        }
        let mut guard = self.write_guard();
        if guard.get(&path).is_some_and(|f| f.readonly) {
            exn::bail!(ErrorKind::PermissionDenied(path));
        }
        guard.insert(
            path,
            MockFile {
                modified: OffsetDateTime::now_utc(),
                data: data.to_vec(),
                readonly: false,
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        self.write_guard().remove(&path).map(|_| ()).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }

    fn set_readonly(&self, path: &Path, readonly: bool) -> Result<()> {
        let path = validate_path(path)?;
        let mut guard = self.write_guard();
        let file = guard.get_mut(&path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.clone())))?;
        file.readonly = readonly;
        Ok(())
    }
}
