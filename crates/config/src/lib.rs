//! Layered configuration: built-in defaults, then a config file (TOML, YAML
//! or JSON, chosen by extension), then `RESRC_*` environment variables.
//! Nested keys are separated by `__` in the environment, e.g.
//! `RESRC_DECOMPILER__PROGRAM=procyon`.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "RESRC_";
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Root of the cache; generated sources live under `gensrc/` inside it.
    pub cache_dir: PathBuf,
    /// Extension of generated source files, without the dot.
    pub extension: String,
    pub decompiler: DecompilerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompilerConfig {
    /// Executable name (looked up on `PATH`) or path.
    pub program: String,
    /// Argument template. `{class}` is replaced with the path of the class
    /// file, `{name}` with the dotted binary name and `{dir}` with the
    /// directory the class files were written to.
    pub args: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let cache_dir = project_dirs()
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("resrc"));
        Self {
            cache_dir,
            extension: "java".to_string(),
            decompiler: DecompilerConfig::default(),
        }
    }
}

impl Default for DecompilerConfig {
    fn default() -> Self {
        Self {
            program: "cfr".to_string(),
            args: vec!["{class}".to_string()],
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "resrc")
}

/// `config.toml` in the platform's config directory.
pub fn default_config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(DEFAULT_CONFIG_FILE))
}

impl Config {
    /// Load from `file`, or from the default config file if there is one.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = match file {
            Some(file) if !file.is_file() => exn::bail!(ErrorKind::MissingFile(file.to_path_buf())),
            Some(file) => Some(file.to_path_buf()),
            None => default_config_file().filter(|file| file.is_file()),
        };
        match &file {
            Some(file) => tracing::debug!(path = %file.display(), "Loading configuration file"),
            None => tracing::debug!("No configuration file, using defaults"),
        }
        Self::from_figment(Self::figment(file.as_deref())?)
    }

    /// Providers in merge order, without extracting.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = match file.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                Some("json") => figment.merge(Json::file(file)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(file.to_path_buf())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().map_err(|e| ErrorKind::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.extension.is_empty() || self.extension.contains(['.', '/', '\\']) {
            exn::bail!(ErrorKind::Invalid(format!("extension must be a bare file extension, got {:?}", self.extension)));
        }
        if self.decompiler.program.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("decompiler.program is empty".to_string()));
        }
        if self.cache_dir.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("cache_dir is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::from_figment(Config::figment(None).unwrap()).unwrap();
            assert_eq!(config.extension, "java");
            assert_eq!(config.decompiler.program, "cfr");
            assert_eq!(config.decompiler.args, vec!["{class}"]);
            assert!(!config.cache_dir.as_os_str().is_empty());
            Ok(())
        });
    }

    #[rstest]
    #[case("config.toml", "extension = \"jav\"\n[decompiler]\nprogram = \"procyon\"\n")]
    #[case("config.yaml", "extension: jav\ndecompiler:\n  program: procyon\n")]
    #[case("config.yml", "extension: jav\ndecompiler:\n  program: procyon\n")]
    #[case("config.json", "{\"extension\": \"jav\", \"decompiler\": {\"program\": \"procyon\"}}")]
    fn test_file_formats(#[case] name: &str, #[case] content: &str) {
        Jail::expect_with(|jail| {
            jail.create_file(name, content)?;
            let config = Config::load(Some(Path::new(name))).unwrap();
            assert_eq!(config.extension, "jav");
            assert_eq!(config.decompiler.program, "procyon");
            // Untouched nested keys keep their defaults.
            assert_eq!(config.decompiler.args, vec!["{class}"]);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "cache_dir = \"/from/file\"\n[decompiler]\nprogram = \"procyon\"\n")?;
            jail.set_env("RESRC_DECOMPILER__PROGRAM", "fernflower");
            let config = Config::load(Some(Path::new("config.toml"))).unwrap();
            assert_eq!(config.cache_dir, PathBuf::from("/from/file"));
            assert_eq!(config.decompiler.program, "fernflower");
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        Jail::expect_with(|_jail| {
            let err = Config::load(Some(Path::new("nope.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::MissingFile(_)));
            Ok(())
        });
    }

    #[test]
    fn test_unsupported_format() {
        Jail::expect_with(|jail| {
            jail.create_file("config.ini", "extension=java")?;
            let err = Config::load(Some(Path::new("config.ini"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
            Ok(())
        });
    }

    #[rstest]
    #[case("extension = \".java\"")]
    #[case("extension = \"\"")]
    #[case("[decompiler]\nprogram = \" \"")]
    #[case("this is not toml")]
    fn test_invalid(#[case] content: &str) {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", content)?;
            let figment = Config::figment(Some(Path::new("config.toml"))).unwrap();
            let err = Config::from_figment(figment).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }
}
