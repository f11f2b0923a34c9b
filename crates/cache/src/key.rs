use crate::GENSRC_DIR;
use crate::error::{ErrorKind, Result};
use resrc_classpath::BinaryRoot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Cache partition: hash of a binary root's path.
///
/// Classes regenerated from the same root share one partition directory, so
/// two roots defining the same class never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_root(root: &BinaryRoot) -> Self {
        let path = root.path().to_string_lossy();
        Self(blake3::hash(path.as_bytes()).to_string())
    }

    /// Accept a partition name as printed by [`Display`](fmt::Display).
    pub fn parse(key: &str) -> Result<Self> {
        let key = key.trim();
        if key.len() != blake3::OUT_LEN * 2 || !key.bytes().all(|b| b.is_ascii_hexdigit()) {
            exn::bail!(ErrorKind::InvalidKey(key.to_string()));
        }
        Ok(Self(key.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage-relative directory of this partition: `gensrc/<key>`.
    pub fn partition_path(&self) -> PathBuf {
        PathBuf::from(GENSRC_DIR).join(&self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash of the format version followed by the class file bytes; decides
/// whether a cached source is still valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn compute(format_version: &[u8], bytes: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(format_version);
        hasher.update(bytes);
        Self(hasher.finalize().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::Path;

    #[test]
    fn test_key_depends_on_root_path_only() {
        let a = CacheKey::for_root(&BinaryRoot::Directory("/p/classes".into()));
        let b = CacheKey::for_root(&BinaryRoot::Directory("/p/classes".into()));
        let c = CacheKey::for_root(&BinaryRoot::Directory("/q/classes".into()));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 64);
        assert_eq!(a.partition_path(), Path::new("gensrc").join(a.as_str()));
        assert_eq!(CacheKey::parse(&a.to_string().to_uppercase()).unwrap(), a);
        // The kind of root plays no part.
        assert_eq!(CacheKey::for_root(&BinaryRoot::Archive("/p/classes".into())), a);
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("../../../../../../../../../../../../../../../../../../../../../../")]
    #[case("zz00000000000000000000000000000000000000000000000000000000000000")]
    fn test_invalid_key(#[case] input: &str) {
        let err = CacheKey::parse(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidKey(_)));
    }

    #[test]
    fn test_content_hash_covers_version_and_bytes() {
        let base = ContentHash::compute(&[0xFF, 0x01], b"\xCA\xFE\xBA\xBE");
        assert_eq!(base, ContentHash::compute(&[0xFF, 0x01], b"\xCA\xFE\xBA\xBE"));
        assert_ne!(base, ContentHash::compute(&[0xFF, 0x02], b"\xCA\xFE\xBA\xBE"));
        assert_ne!(base, ContentHash::compute(&[0xFF, 0x01], b"\xCA\xFE\xBA\xBF"));
    }
}
