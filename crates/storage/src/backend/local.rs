//! Local filesystem storage backend.
//!
//! Files are stored in a configured directory and accessed with blocking
//! `std::fs` calls. Writes go through a temporary file in the destination
//! directory which is then renamed into place.

use crate::error::ErrorKind;
use crate::{FileInfo, StorageBackend, error::Result, path::validate as validate_path};
use exn::ResultExt;
use std::fs::{self, Metadata, Permissions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

enum WalkEntry {
    File(FileInfo),
    Descend(PathBuf),
    Skip,
}

/// Local filesystem storage backend.
///
/// Stores files in a directory on the local filesystem. All paths are relative
/// to the configured root directory.
///
/// # Examples
///
/// ```no_run
/// use resrc_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("cache", "/home/me/.cache/resrc")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    /// Root directory of the cache
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend, creating the root directory if
    /// it doesn't exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or exists but is not a
    /// directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            fs::create_dir_all(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { name: name.into(), root })
    }

    /// Root directory of this backend.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the absolute path for a relative storage path.
    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    /// Convert an absolute path back to a relative storage path.
    fn relative_path(&self, absolute: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = absolute.as_ref();
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::BackendError(format!("path `{:?}` is not within root `{:?}`", absolute, self.root))
        })?;
        validate_path(relative)
    }

    fn info(path: &Path, metadata: &Metadata) -> Result<FileInfo> {
        let modified = metadata.modified().map_err(ErrorKind::Io)?.into();
        Ok(FileInfo::new(path, metadata.len(), modified, metadata.permissions().readonly()))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    fn process_entry(&self, entry: fs::DirEntry, prefix: Option<&Path>) -> Result<WalkEntry> {
        let path = entry.path();
        let metadata = entry.metadata().map_err(|e| Self::map_io_error(e, &path))?;
        let relative = self.relative_path(&path)?;
        if metadata.is_dir() {
            // Keep descending while the directory could still lead to the prefix.
            return match prefix {
                Some(pfx) if !relative.starts_with(pfx) && !pfx.starts_with(&relative) => Ok(WalkEntry::Skip),
                _ => Ok(WalkEntry::Descend(path)),
            };
        }
        if let Some(pfx) = prefix
            && !relative.starts_with(pfx)
        {
            return Ok(WalkEntry::Skip);
        }
        if metadata.is_file() {
            return Ok(WalkEntry::File(Self::info(&relative, &metadata)?));
        }
        // Most likely a broken symlink.
        Ok(WalkEntry::Skip)
    }

    #[cfg(unix)]
    fn permissions(current: Permissions, readonly: bool) -> Permissions {
        use std::os::unix::fs::PermissionsExt;
        let mode = current.mode();
        // Only ever hand write access back to the owner.
        let mode = if readonly { mode & !0o222 } else { mode | 0o200 };
        Permissions::from_mode(mode)
    }

    #[cfg(not(unix))]
    fn permissions(mut current: Permissions, readonly: bool) -> Permissions {
        current.set_readonly(readonly);
        current
    }
}

impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn local_path(&self, path: &Path) -> Option<PathBuf> {
        self.absolute_path(path).ok()
    }

    fn list(&self, prefix: Option<&Path>) -> Result<Vec<FileInfo>> {
        let prefix = prefix.map(validate_path).transpose()?;
        let mut files = Vec::new();
        let mut stack = vec![self.root.clone()];
        while let Some(current) = stack.pop() {
            let entries = match fs::read_dir(&current) {
                Ok(entries) => entries,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => exn::bail!(Self::map_io_error(err, &current)),
            };
            for entry in entries {
                let entry = entry.map_err(|e| Self::map_io_error(e, &current))?;
                match self.process_entry(entry, prefix.as_deref())? {
                    WalkEntry::File(f) => files.push(f),
                    WalkEntry::Descend(d) => stack.push(d),
                    WalkEntry::Skip => {},
                }
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn exists(&self, path: &Path) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        Ok(abs_path.try_exists().map_err(ErrorKind::Io)?)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).map_err(|e| Self::map_io_error(e, path))?)
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        let Some(parent) = abs_path.parent() else {
            exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
        };
        fs::create_dir_all(parent).map_err(|e| Self::map_io_error(e, path))?;
        // A rename would happily replace a read-only file on Unix; keep the
        // behaviour identical across platforms.
        if let Ok(metadata) = fs::metadata(&abs_path)
            && metadata.permissions().readonly()
        {
            exn::bail!(ErrorKind::PermissionDenied(path.to_path_buf()));
        }
        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| Self::map_io_error(e, path))?;
        tmp.write_all(data).map_err(ErrorKind::Io)?;
        tmp.as_file().sync_all().map_err(ErrorKind::Io)?;
        tmp.persist(&abs_path).map_err(|e| Self::map_io_error(e.error, path))?;
        tracing::trace!(backend = %self.name, path = %path.display(), bytes = data.len(), "File written");
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::remove_file(&abs_path).map_err(|e| Self::map_io_error(e, path))?)
    }

    fn set_readonly(&self, path: &Path, readonly: bool) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        let metadata = fs::metadata(&abs_path).map_err(|e| Self::map_io_error(e, path))?;
        let permissions = Self::permissions(metadata.permissions(), readonly);
        Ok(fs::set_permissions(&abs_path, permissions).map_err(|e| Self::map_io_error(e, path))?)
    }
}
