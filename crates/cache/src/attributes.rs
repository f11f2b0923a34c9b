use crate::ContentHash;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Suffix appended to a generated file's name to get its sidecar.
pub const SIDECAR_SUFFIX: &str = ".attrs";

/// Metadata stored next to every generated file. The generated file itself
/// holds nothing but source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    /// Hash of the class file the text was generated from.
    #[serde(rename = "origin-hash")]
    pub origin_hash: ContentHash,
    /// Generated code may not compile; tooling should not report errors in it.
    #[serde(rename = "disable-java-errors")]
    pub disable_java_errors: bool,
    /// URL of the binary root that owned the class file.
    #[serde(rename = "classfile-root")]
    pub classfile_root: Url,
    /// Slash-separated binary name of the class file.
    #[serde(rename = "classfile-binaryName")]
    pub classfile_binary_name: String,
}

impl Attributes {
    pub(crate) fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).or_raise(|| ErrorKind::InvalidData)
    }

    pub(crate) fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).or_raise(|| ErrorKind::InvalidData)
    }
}

pub(crate) fn sidecar_path(path: &Path) -> PathBuf {
    let mut sidecar = path.as_os_str().to_owned();
    sidecar.push(SIDECAR_SUFFIX);
    PathBuf::from(sidecar)
}
