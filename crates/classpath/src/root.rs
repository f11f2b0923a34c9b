use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind as IoErrorKind, Read};
use std::path::{Component, Path, PathBuf};
use url::Url;
use zip::ZipArchive;
use zip::result::ZipError;

/// A container of compiled classes: a directory tree, or a jar/zip archive.
///
/// Identity is the absolute path. Roots that don't exist on disk are valid;
/// they simply contain nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BinaryRoot {
    Directory(PathBuf),
    Archive(PathBuf),
}

impl BinaryRoot {
    /// Classify `path` as a directory or an archive root.
    ///
    /// Existing regular files are archives, so are non-existing paths ending in
    /// `.jar` or `.zip`. Anything else is a directory.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let absolute = std::path::absolute(path).or_raise(|| ErrorKind::InvalidRoot(path.to_path_buf()))?;
        let is_archive = if absolute.exists() {
            absolute.is_file()
        } else {
            absolute
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("jar") || e.eq_ignore_ascii_case("zip"))
        };
        Ok(if is_archive { Self::Archive(absolute) } else { Self::Directory(absolute) })
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Directory(path) | Self::Archive(path) => path,
        }
    }

    /// Stable URL identity: `file:///dir/` for directories and
    /// `jar:file:///lib.jar!/` for archives.
    pub fn url(&self) -> Result<Url> {
        let invalid = || ErrorKind::InvalidRoot(self.path().to_path_buf());
        match self {
            Self::Directory(path) => Url::from_directory_path(path).map_err(|()| exn::Exn::from(invalid())),
            Self::Archive(path) => {
                let file = Url::from_file_path(path).map_err(|()| exn::Exn::from(invalid()))?;
                Url::parse(&format!("jar:{file}!/")).or_raise(invalid)
            },
        }
    }

    /// Inverse of [`url`](Self::url).
    pub fn from_url(url: &Url) -> Result<Self> {
        let invalid = || ErrorKind::InvalidRoot(PathBuf::from(url.as_str()));
        match url.scheme() {
            "file" => {
                let path = url.to_file_path().map_err(|()| exn::Exn::from(invalid()))?;
                // Drop the trailing slash so the path matches what `new` produced.
                Ok(Self::Directory(path.components().collect()))
            },
            "jar" => {
                let inner = url.as_str().strip_prefix("jar:").and_then(|s| s.strip_suffix("!/")).ok_or_else(invalid)?;
                let file = Url::parse(inner).or_raise(invalid)?;
                let path = file.to_file_path().map_err(|()| exn::Exn::from(invalid()))?;
                Ok(Self::Archive(path))
            },
            _ => exn::bail!(invalid()),
        }
    }

    /// Read a resource such as `a/b/C.class`. `Ok(None)` when this root does
    /// not hold it.
    pub fn read(&self, resource: &str) -> Result<Option<Vec<u8>>> {
        let relative = resource_path(resource)?;
        match self {
            Self::Directory(root) => {
                let path = root.join(relative);
                match std::fs::read(&path) {
                    Ok(bytes) => Ok(Some(bytes)),
                    Err(e) if matches!(e.kind(), IoErrorKind::NotFound | IoErrorKind::NotADirectory) => Ok(None),
                    Err(e) => Err(e).or_raise(|| ErrorKind::Io(path)),
                }
            },
            Self::Archive(path) => {
                let Some(mut archive) = self.open_archive(path)? else {
                    return Ok(None);
                };
                let mut entry = match archive.by_name(resource) {
                    Ok(entry) => entry,
                    Err(ZipError::FileNotFound) => return Ok(None),
                    Err(e) => return Err(e).or_raise(|| ErrorKind::Archive(path.clone())),
                };
                let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
                entry.read_to_end(&mut bytes).or_raise(|| ErrorKind::Io(path.clone()))?;
                Ok(Some(bytes))
            },
        }
    }

    pub fn contains(&self, resource: &str) -> Result<bool> {
        let relative = resource_path(resource)?;
        match self {
            Self::Directory(root) => Ok(root.join(relative).is_file()),
            Self::Archive(path) => {
                let Some(archive) = self.open_archive(path)? else {
                    return Ok(false);
                };
                Ok(archive.file_names().any(|name| name == resource))
            },
        }
    }

    /// Resource names (full, slash separated) of the files directly inside
    /// `directory`, which is itself a slash-separated resource path. The empty
    /// string lists the root.
    pub fn list(&self, directory: &str) -> Result<Vec<String>> {
        let prefix = if directory.is_empty() {
            String::new()
        } else {
            resource_path(directory)?;
            format!("{}/", directory.trim_end_matches('/'))
        };
        let mut names = match self {
            Self::Directory(root) => {
                let dir = root.join(&prefix);
                let entries = match std::fs::read_dir(&dir) {
                    Ok(entries) => entries,
                    Err(e) if matches!(e.kind(), IoErrorKind::NotFound | IoErrorKind::NotADirectory) => {
                        return Ok(Vec::new());
                    },
                    Err(e) => return Err(e).or_raise(|| ErrorKind::Io(dir)),
                };
                let mut names = Vec::new();
                for entry in entries {
                    let entry = entry.or_raise(|| ErrorKind::Io(dir.clone()))?;
                    if entry.file_type().is_ok_and(|t| t.is_file())
                        && let Some(file_name) = entry.file_name().to_str()
                    {
                        names.push(format!("{prefix}{file_name}"));
                    }
                }
                names
            },
            Self::Archive(path) => {
                let Some(archive) = self.open_archive(path)? else {
                    return Ok(Vec::new());
                };
                archive
                    .file_names()
                    .filter(|name| name.strip_prefix(&prefix).is_some_and(|rest| !rest.is_empty() && !rest.contains('/')))
                    .map(str::to_string)
                    .collect()
            },
        };
        names.sort();
        Ok(names)
    }

    fn open_archive(&self, path: &Path) -> Result<Option<ZipArchive<File>>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).or_raise(|| ErrorKind::Io(path.to_path_buf())),
        };
        Ok(Some(ZipArchive::new(file).or_raise(|| ErrorKind::Archive(path.to_path_buf()))?))
    }
}

impl fmt::Display for BinaryRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

// Resource names are always relative and must not climb out of the root.
fn resource_path(resource: &str) -> Result<PathBuf> {
    let path = Path::new(resource);
    let valid = !resource.is_empty()
        && !resource.contains('\\')
        && path.components().all(|c| matches!(c, Component::Normal(_)));
    if !valid {
        exn::bail!(ErrorKind::InvalidName(resource.to_string()));
    }
    Ok(path.to_path_buf())
}
