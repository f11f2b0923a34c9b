use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use resrc_cache::error::ErrorKind as CacheErrorKind;
use resrc_cache::{CacheKey, CachedArtifact, Cancellation, ContentCache, Effort};
use resrc_classpath::error::ErrorKind as ClassPathErrorKind;
use resrc_classpath::{BinaryName, BinaryRoot, ClassPath, SymbolRef};
use resrc_decompile::{Decompiler, Diagnostic, ResultCollector};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

/// A generated source file, ready to be shown.
#[derive(Debug, Clone)]
pub struct Generated {
    pub artifact: CachedArtifact,
    pub effort: Effort,
    /// What the engine reported, if it ran.
    pub diagnostics: Vec<Diagnostic>,
}

/// Turns symbols into generated source files: finds the class file on a
/// class path, and returns the cached source for it, running the decompiler
/// first when nothing up to date is stored.
pub struct SourceGenerator {
    cache: ContentCache,
    decompiler: Arc<dyn Decompiler>,
}

impl SourceGenerator {
    pub fn new(cache: ContentCache, decompiler: Arc<dyn Decompiler>) -> Self {
        Self { cache, decompiler }
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn decompiler(&self) -> &dyn Decompiler {
        self.decompiler.as_ref()
    }

    /// Where a generated file lives on the local filesystem, if the cache is
    /// backed by one.
    pub fn local_path(&self, generated: &Generated) -> Option<PathBuf> {
        self.cache.local_path(&generated.artifact)
    }

    /// Generated source for the compiled unit declaring `symbol`.
    ///
    /// Never fails: anything that prevents generation is logged and yields
    /// `None`. See [`generate_inner`](Self::generate_inner) for the reasons.
    #[instrument(skip_all, fields(symbol = %symbol))]
    pub fn generate(&self, classpath: &ClassPath, symbol: &SymbolRef, cancel: &Cancellation) -> Option<Generated> {
        self.generate_inner(classpath, symbol, cancel).map_err(log_failure).ok()
    }

    /// # Errors
    ///
    /// - [`ErrorKind::UnsupportedSymbolKind`] for packages.
    /// - [`ErrorKind::ArtifactNotFound`] if no root holds the class file.
    /// - [`ErrorKind::EngineProducedNoResult`] if the decompiler produced
    ///   nothing (or could not be run). A previously stored file is kept.
    /// - [`ErrorKind::StorageFailure`] for I/O failures on either side.
    /// - [`ErrorKind::Cancelled`] if `cancel` fired before the cache write.
    pub fn generate_inner(&self, classpath: &ClassPath, symbol: &SymbolRef, cancel: &Cancellation) -> Result<Generated> {
        if !symbol.kind().is_regenerable() {
            exn::bail!(ErrorKind::UnsupportedSymbolKind(symbol.to_string()));
        }
        let name = symbol.binary_name().or_raise(|| ErrorKind::UnsupportedSymbolKind(symbol.to_string()))?;
        self.generate_binary(classpath, &name, cancel)
    }

    /// Re-check a previously generated file against the class file it was
    /// generated from, regenerating it if that changed. Works from the
    /// provenance stored with the file, no symbol needed.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn revalidate(&self, path: &Path, cancel: &Cancellation) -> Option<Generated> {
        self.revalidate_inner(path, cancel).map_err(log_failure).ok()
    }

    /// `path` is storage-relative (`gensrc/<key>/a/b/C.java`).
    ///
    /// # Errors
    ///
    /// [`ErrorKind::ArtifactNotFound`] if `path` is not a generated file, or
    /// its class file is gone. Otherwise as for
    /// [`generate_inner`](Self::generate_inner).
    pub fn revalidate_inner(&self, path: &Path, cancel: &Cancellation) -> Result<Generated> {
        let not_found = || ErrorKind::ArtifactNotFound(path.display().to_string());
        let Some(artifact) = self.cache.artifact_at(path).or_raise(|| ErrorKind::StorageFailure)? else {
            exn::bail!(not_found());
        };
        let root = BinaryRoot::from_url(&artifact.attributes.classfile_root).or_raise(not_found)?;
        if CacheKey::for_root(&root) != artifact.key {
            tracing::warn!(root = %root, key = %artifact.key, "Recorded root does not match the partition");
        }
        self.generate_binary(&ClassPath::new([root]), &artifact.binary_name, cancel)
    }

    fn generate_binary(&self, classpath: &ClassPath, name: &BinaryName, cancel: &Cancellation) -> Result<Generated> {
        if cancel.is_cancelled() {
            exn::bail!(ErrorKind::Cancelled);
        }
        let resource = match classpath.locate(name) {
            Ok(resource) => resource,
            Err(e) if matches!(e.deref(), ClassPathErrorKind::NotFound(_)) => {
                exn::bail!(ErrorKind::ArtifactNotFound(name.dotted()));
            },
            Err(e) => return Err(e).or_raise(|| ErrorKind::StorageFailure),
        };
        let key = CacheKey::for_root(&resource.root);
        tracing::debug!(root = %resource.root, key = %key, "Class file located");

        let regenerate = |bytes: &[u8], name: &BinaryName| {
            let mut sink = ResultCollector::new();
            self.decompiler
                .decompile(bytes, name, classpath, &mut sink)
                .or_raise(|| CacheErrorKind::Engine)?;
            Ok::<_, resrc_cache::error::Error>(sink.finish())
        };
        let cached = match self.cache.get_or_regenerate(&key, name, &resource.root, &resource.bytes, cancel, regenerate)
        {
            Ok(cached) => cached,
            Err(e) => {
                let kind = match e.deref() {
                    CacheErrorKind::RegenerationFailed(_) | CacheErrorKind::Engine => {
                        ErrorKind::EngineProducedNoResult(name.dotted())
                    },
                    CacheErrorKind::Cancelled => ErrorKind::Cancelled,
                    _ => ErrorKind::StorageFailure,
                };
                return Err(e).or_raise(|| kind);
            },
        };
        Ok(Generated {
            artifact: cached.artifact,
            effort: cached.effort,
            diagnostics: cached.diagnostics,
        })
    }
}

fn log_failure(e: crate::error::Error) {
    match e.deref() {
        ErrorKind::UnsupportedSymbolKind(_) => tracing::debug!(error = ?e, "Nothing to generate"),
        ErrorKind::ArtifactNotFound(_) => tracing::info!(error = ?e, "Cannot find class file"),
        ErrorKind::Cancelled => tracing::debug!("Generation cancelled"),
        ErrorKind::EngineProducedNoResult(_) | ErrorKind::StorageFailure => {
            tracing::warn!(error = ?e, "Source generation failed");
        },
    }
}
