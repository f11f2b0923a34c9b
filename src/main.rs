mod cli;

use crate::cli::{ClassPathArgs, Cli, Commands, LsArgs, RefreshArgs, SymbolArgs};
use clap::Parser;
use derive_more::{Display, Error};
use exn::ResultExt;
use resrc::{Cancellation, Generated, Position, SourceGenerator};
use resrc_cache::{CacheKey, ContentCache};
use resrc_classpath::{BinaryRoot, ClassPath, SymbolRef};
use resrc_config::Config;
use resrc_decompile::CommandDecompiler;
use resrc_storage::backend::LocalBackend;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Display, Error)]
enum CliError {
    #[display("invalid configuration")]
    Config,
    #[display("cannot open cache directory")]
    Storage,
    #[display("decompiler unavailable")]
    Decompiler,
    #[display("invalid argument: {_0}")]
    Argument(#[error(not(source))] String),
}

type Result<T> = std::result::Result<T, exn::Exn<CliError>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("resrc: cannot install logger: {e}");
    }

    let cancel = Cancellation::new();
    let handler = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler.cancel()) {
        tracing::warn!(error = %e, "Cannot install Ctrl-C handler");
    }

    match run(cli, &cancel) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("resrc: {e:?}");
            ExitCode::from(2)
        },
    }
}

fn init_tracing(verbose: u8) -> std::result::Result<(), SetGlobalDefaultError> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}

fn run(cli: Cli, cancel: &Cancellation) -> Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref()).or_raise(|| CliError::Config)?;
    if let Some(cache_dir) = cli.cache_dir {
        config.cache_dir = cache_dir;
    }
    let cache_dir = std::path::absolute(&config.cache_dir).or_raise(|| CliError::Storage)?;
    let backend = Arc::new(LocalBackend::new("cache", &cache_dir).or_raise(|| CliError::Storage)?);
    let cache = ContentCache::new(backend.clone()).with_extension(&config.extension);

    match cli.command {
        Commands::Open(args) => {
            let (generator, classpath, symbol) = prepare(cache, &config, args)?;
            let print = |generated: &Generated, position: Position| {
                let path = generator.local_path(generated).unwrap_or_else(|| generated.artifact.path.clone());
                println!("{}:{position}", path.display());
                true
            };
            Ok(exit_code(resrc::open(&generator, &classpath, &symbol, cancel, &print)))
        },
        Commands::Cat(args) => {
            let (generator, classpath, symbol) = prepare(cache, &config, args)?;
            let Some(generated) = generator.generate(&classpath, &symbol, cancel) else {
                return Ok(ExitCode::FAILURE);
            };
            match generator.cache().read_text(&generated.artifact) {
                Ok(text) => {
                    print!("{text}");
                    Ok(ExitCode::SUCCESS)
                },
                Err(e) => {
                    tracing::error!(error = ?e, "Cannot read generated source");
                    Ok(ExitCode::FAILURE)
                },
            }
        },
        Commands::Ls(LsArgs { partition }) => {
            let partition = partition
                .map(|key| CacheKey::parse(&key).or_raise(|| CliError::Argument(format!("partition {key}"))))
                .transpose()?;
            let artifacts = cache.list(partition.as_ref()).or_raise(|| CliError::Storage)?;
            for artifact in artifacts {
                println!(
                    "{}\t{}\t{}",
                    artifact.key,
                    artifact.binary_name.dotted(),
                    artifact.attributes.classfile_root
                );
            }
            Ok(ExitCode::SUCCESS)
        },
        Commands::Refresh(RefreshArgs { file }) => {
            let path = storage_path(&cache_dir, &file)?;
            let generator = SourceGenerator::new(cache, decompiler(&config)?);
            match generator.revalidate(&path, cancel) {
                Some(generated) => {
                    println!("{:?}\t{}", generated.effort, path.display());
                    Ok(ExitCode::SUCCESS)
                },
                None => Ok(ExitCode::FAILURE),
            }
        },
    }
}

fn prepare(cache: ContentCache, config: &Config, args: SymbolArgs) -> Result<(SourceGenerator, ClassPath, SymbolRef)> {
    let symbol = SymbolRef::parse(&args.symbol).or_raise(|| CliError::Argument(args.symbol.clone()))?;
    let classpath = classpath(args.classpath)?;
    if classpath.is_empty() {
        exn::bail!(CliError::Argument("no class path roots given".to_string()));
    }
    tracing::debug!(classpath = %classpath, "Class path");
    Ok((SourceGenerator::new(cache, decompiler(config)?), classpath, symbol))
}

fn classpath(args: ClassPathArgs) -> Result<ClassPath> {
    let roots = |paths: Vec<PathBuf>| -> Result<Vec<BinaryRoot>> {
        paths
            .into_iter()
            .map(|path| BinaryRoot::new(&path).or_raise(|| CliError::Argument(path.display().to_string())))
            .collect()
    };
    Ok(ClassPath::from_kinds(roots(args.roots)?, roots(args.boot)?, roots(args.source)?))
}

fn decompiler(config: &Config) -> Result<Arc<CommandDecompiler>> {
    let decompiler = CommandDecompiler::discover(&config.decompiler.program, config.decompiler.args.iter().cloned())
        .or_raise(|| CliError::Decompiler)?;
    Ok(Arc::new(decompiler))
}

// Generated files are addressed relative to the cache directory.
fn storage_path(cache_dir: &Path, file: &Path) -> Result<PathBuf> {
    if file.is_relative() {
        return Ok(file.to_path_buf());
    }
    file.strip_prefix(cache_dir)
        .map(Path::to_path_buf)
        .or_raise(|| CliError::Argument(format!("{} is not inside {}", file.display(), cache_dir.display())))
}

fn exit_code(success: bool) -> ExitCode {
    if success { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
