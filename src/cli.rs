//! Command-line interface definitions.
//!
//! ```bash
//! # Generate source for a class and print where to open it
//! resrc open 'com.example.Foo#run()' --root target/classes --root lib/dep.jar
//!
//! # Print the generated source
//! resrc cat com.example.Foo --root target/classes
//!
//! # List everything cached, or one partition
//! resrc ls
//!
//! # Re-check a generated file against its class file
//! resrc refresh ~/.cache/resrc/gensrc/<key>/com/example/Foo.java
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Regenerated, cached Java source for compiled classes.
#[derive(Debug, Parser)]
#[command(name = "resrc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG
    /// takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "RESRC_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cache directory, overriding the configuration
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate source for a symbol and print `file:line:column`
    Open(SymbolArgs),
    /// Generate source for a symbol and print it
    Cat(SymbolArgs),
    /// List cached files
    Ls(LsArgs),
    /// Re-check a generated file against the class file it came from
    Refresh(RefreshArgs),
}

#[derive(Debug, Args)]
pub struct SymbolArgs {
    /// `a.b.C`, `a.b.C$Inner`, `a.b.C#field`, `a.b.C#method(int, String)`,
    /// `a.b.C#<init>()` or `module:name`
    #[arg(value_name = "SYMBOL")]
    pub symbol: String,

    #[command(flatten)]
    pub classpath: ClassPathArgs,
}

/// Class path roots, searched in order: `--root` entries first, then
/// `--boot`, then `--source`.
#[derive(Debug, Args)]
pub struct ClassPathArgs {
    /// Compiled output directory or jar
    #[arg(short, long = "root", value_name = "PATH")]
    pub roots: Vec<PathBuf>,

    /// Platform classes directory or jar
    #[arg(long = "boot", value_name = "PATH")]
    pub boot: Vec<PathBuf>,

    /// Source root holding class files
    #[arg(long = "source", value_name = "PATH")]
    pub source: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct LsArgs {
    /// Only this partition
    #[arg(short, long, value_name = "KEY")]
    pub partition: Option<String>,
}

#[derive(Debug, Args)]
pub struct RefreshArgs {
    /// Generated file, absolute or relative to the cache directory
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}
