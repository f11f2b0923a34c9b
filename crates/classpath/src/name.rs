use crate::CLASS_SUFFIX;
use crate::error::{ErrorKind, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Slash-separated fully-qualified name of one compiled unit, e.g.
/// `java/util/Map$Entry`.
///
/// Accepts dotted input (`java.util.Map$Entry`) and normalizes it. Every
/// segment becomes a path component inside the cache, so segments that could
/// escape a directory (`..`, separators, NUL) are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinaryName(String);

impl BinaryName {
    /// Reserved name of a module descriptor.
    pub const MODULE_INFO: &'static str = "module-info";

    pub fn parse(name: &str) -> Result<Self> {
        let normalized = name.trim().replace('.', "/");
        if normalized.is_empty() {
            exn::bail!(ErrorKind::InvalidName(name.to_string()));
        }
        for segment in normalized.split('/') {
            let invalid = segment.is_empty()
                || segment.starts_with('$')
                || segment.chars().any(|c| c.is_whitespace() || c.is_control() || matches!(c, ';' | '[' | '<' | '>' | '\\' | ':'));
            if invalid {
                exn::bail!(ErrorKind::InvalidName(name.to_string()));
            }
        }
        Ok(Self(normalized))
    }

    pub fn module_info() -> Self {
        Self(Self::MODULE_INFO.to_string())
    }

    /// Parse a resource name such as `a/b/C.class`.
    pub fn from_resource_name(resource: &str) -> Result<Self> {
        let Some(stem) = resource.strip_suffix(CLASS_SUFFIX) else {
            exn::bail!(ErrorKind::InvalidName(resource.to_string()));
        };
        if stem == Self::MODULE_INFO {
            return Ok(Self::module_info());
        }
        // Dots are legal in resource paths but never in a class file's name.
        if stem.contains('.') {
            exn::bail!(ErrorKind::InvalidName(resource.to_string()));
        }
        Self::parse(stem)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_module_info(&self) -> bool {
        self.0 == Self::MODULE_INFO
    }

    /// The top-level class a nested class is compiled alongside:
    /// `a/b/C$D$E` becomes `a/b/C`.
    pub fn outermost(&self) -> Self {
        let (package, simple) = self.split();
        match simple.find('$') {
            Some(idx) => Self(format!("{package}{}", &simple[..idx])),
            None => self.clone(),
        }
    }

    /// Package part, slash separated, without the trailing slash. `None` for
    /// the unnamed package.
    pub fn package(&self) -> Option<&str> {
        self.0.rfind('/').map(|idx| &self.0[..idx])
    }

    /// Last segment, including any `$Nested` suffix.
    pub fn simple_name(&self) -> &str {
        self.split().1
    }

    /// Simple names of the enclosing chain, outermost first: `a/b/C$D` gives
    /// `["C", "D"]`.
    pub fn nesting(&self) -> Vec<&str> {
        self.simple_name().split('$').filter(|s| !s.is_empty()).collect()
    }

    pub fn dotted(&self) -> String {
        self.0.replace('/', ".")
    }

    /// Name of the class file resource: `a/b/C.class`.
    pub fn resource_name(&self) -> String {
        format!("{}{CLASS_SUFFIX}", self.0)
    }

    /// Relative path of the generated source: `a/b/C.<extension>`.
    pub fn source_path(&self, extension: &str) -> PathBuf {
        PathBuf::from(format!("{}.{extension}", self.0))
    }

    // Package prefix including the trailing slash, and the simple name.
    fn split(&self) -> (&str, &str) {
        match self.0.rfind('/') {
            Some(idx) => (&self.0[..=idx], &self.0[idx + 1..]),
            None => ("", &self.0),
        }
    }
}

impl fmt::Display for BinaryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BinaryName {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for BinaryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::Path;

    #[rstest]
    #[case("a.b.C", "a/b/C")]
    #[case("a/b/C", "a/b/C")]
    #[case("Foo", "Foo")]
    #[case(" java.util.Map$Entry ", "java/util/Map$Entry")]
    #[case("module-info", "module-info")]
    fn test_parse(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(BinaryName::parse(input).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("a..b")]
    #[case("a/b/")]
    #[case("/a/b")]
    #[case("a/$b")]
    #[case("a b")]
    #[case("a\\b")]
    #[case("java.util.List<String>")]
    #[case("[I")]
    fn test_parse_invalid(#[case] input: &str) {
        let err = BinaryName::parse(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidName(_)));
    }

    #[rstest]
    #[case("a/b/C", "a/b/C")]
    #[case("a/b/C$D", "a/b/C")]
    #[case("a/b/C$D$1", "a/b/C")]
    #[case("C$D", "C")]
    fn test_outermost(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(BinaryName::parse(input).unwrap().outermost().as_str(), expected);
    }

    #[test]
    fn test_parts() {
        let name = BinaryName::parse("java.util.Map$Entry").unwrap();
        assert_eq!(name.package(), Some("java/util"));
        assert_eq!(name.simple_name(), "Map$Entry");
        assert_eq!(name.nesting(), vec!["Map", "Entry"]);
        assert_eq!(name.dotted(), "java.util.Map$Entry");
        assert_eq!(name.resource_name(), "java/util/Map$Entry.class");
        assert_eq!(name.outermost().source_path("java"), Path::new("java/util/Map.java"));
        assert_eq!(BinaryName::parse("Foo").unwrap().package(), None);
    }

    #[rstest]
    #[case("a/b/C.class", Some("a/b/C"))]
    #[case("module-info.class", Some("module-info"))]
    #[case("a/b/C.java", None)]
    #[case("META-INF/x.y.class", None)]
    fn test_from_resource_name(#[case] input: &str, #[case] expected: Option<&str>) {
        let parsed = BinaryName::from_resource_name(input).ok();
        assert_eq!(parsed.as_ref().map(BinaryName::as_str), expected);
    }

    #[test]
    fn test_module_info() {
        assert!(BinaryName::module_info().is_module_info());
        assert_eq!(BinaryName::module_info().resource_name(), "module-info.class");
    }
}
