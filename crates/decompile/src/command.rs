use crate::error::{ErrorKind, Result};
use crate::sink::{Output, ResultCollector, SinkClass, SinkType, negotiate};
use crate::{ClassFileSource, Decompiler};
use exn::ResultExt;
use resrc_classpath::BinaryName;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::instrument;

/// Placeholder for the path of the materialized class file.
pub const CLASS_PLACEHOLDER: &str = "{class}";
/// Placeholder for the dotted binary name.
pub const NAME_PLACEHOLDER: &str = "{name}";
/// Placeholder for the directory holding the materialized class files.
pub const DIR_PLACEHOLDER: &str = "{dir}";

/// Runs an external decompiler executable, e.g. CFR.
///
/// The class file and its nested companions are written to a temporary
/// directory laid out like a class path root, the argument template is
/// expanded and the process runs in that directory. Standard output is the
/// regenerated source; standard error lines are informational diagnostics and
/// a non-zero exit status is reported as a failure diagnostic.
#[derive(Debug, Clone)]
pub struct CommandDecompiler {
    name: String,
    program: PathBuf,
    args: Vec<String>,
}

impl CommandDecompiler {
    pub fn new(program: impl Into<PathBuf>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let program = program.into();
        let name = program.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "decompiler".to_string());
        Self {
            name,
            program,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Find `program` on `PATH` (or accept it as-is if it is already a path to
    /// an executable).
    pub fn discover(program: &str, args: impl IntoIterator<Item = impl Into<String>>) -> Result<Self> {
        let Ok(path) = which::which(program) else {
            tracing::info!(program = %program, "Decompiler executable not found");
            exn::bail!(ErrorKind::ProgramNotFound(program.to_string()));
        };
        tracing::debug!(program = %path.display(), "Discovered decompiler");
        Ok(Self::new(path, args))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn expand(&self, class: &Path, name: &BinaryName, dir: &Path) -> Vec<OsString> {
        let class = class.to_string_lossy();
        let dir = dir.to_string_lossy();
        let dotted = name.dotted();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(CLASS_PLACEHOLDER, &class)
                    .replace(NAME_PLACEHOLDER, &dotted)
                    .replace(DIR_PLACEHOLDER, &dir)
                    .into()
            })
            .collect()
    }

    fn materialize(&self, dir: &Path, resource: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = dir.join(resource);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Io)?;
        }
        std::fs::write(&path, bytes).or_raise(|| ErrorKind::Io)?;
        Ok(path)
    }
}

impl Decompiler for CommandDecompiler {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip_all, fields(decompiler = %self.name, name = %name))]
    fn decompile(
        &self,
        bytes: &[u8],
        name: &BinaryName,
        source: &dyn ClassFileSource,
        sink: &mut ResultCollector,
    ) -> Result<()> {
        let workdir = tempfile::tempdir().or_raise(|| ErrorKind::Io)?;
        let class = self.materialize(workdir.path(), &name.resource_name(), bytes)?;
        for companion in source.companions(name)? {
            self.materialize(workdir.path(), &companion.resource, &companion.bytes)?;
        }

        let args = self.expand(&class, name, workdir.path());
        tracing::debug!(program = %self.program.display(), ?args, "Running decompiler");
        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(workdir.path())
            .output()
            .or_raise(|| ErrorKind::Spawn(self.program.display().to_string()))?;

        for line in String::from_utf8_lossy(&output.stderr).lines().filter(|l| !l.trim().is_empty()) {
            sink.accept(SinkType::Progress, Output::Text(line.to_string()));
        }
        if !output.status.success() {
            sink.record_failure(format!("{} exited with {}", self.name, output.status));
            return Ok(());
        }
        let java = String::from_utf8_lossy(&output.stdout).into_owned();
        if java.trim().is_empty() {
            sink.record_failure(format!("{} produced no output for {}", self.name, name.dotted()));
            return Ok(());
        }
        // Only plain text can be offered from a process' standard output.
        let available = [SinkClass::String];
        match negotiate(&sink.supported_sinks(SinkType::Java, &available), &available) {
            Some(SinkClass::String) => sink.accept(SinkType::Java, Output::Text(java)),
            _ => sink.record_failure("no common output format with the result sink"),
        }
        Ok(())
    }
}
