//! Readable source for compiled classes.
//!
//! Given a symbol such as `a.b.C#run()` and an ordered class path,
//! [`SourceGenerator`] finds the class file that declares it, regenerates
//! Java source from it with an external decompiler, and caches the result per
//! binary root so unchanged class files are never decompiled twice.
//! [`SourceGenerator::position`] then finds the declaration in the generated
//! text, and [`open`] composes both for a UI.
//!
//! ```no_run
//! use resrc::{Cancellation, SourceGenerator};
//! use resrc_cache::ContentCache;
//! use resrc_classpath::{BinaryRoot, ClassPath, SymbolRef};
//! use resrc_decompile::CommandDecompiler;
//! use resrc_storage::backend::LocalBackend;
//! use std::sync::Arc;
//!
//! let backend = Arc::new(LocalBackend::new("cache", "/var/cache/resrc").unwrap());
//! let decompiler = Arc::new(CommandDecompiler::discover("cfr", ["{class}"]).unwrap());
//! let generator = SourceGenerator::new(ContentCache::new(backend), decompiler);
//!
//! let classpath = ClassPath::new([BinaryRoot::new("target/classes").unwrap()]);
//! let symbol = SymbolRef::parse("a.b.C#run()").unwrap();
//! if let Some(generated) = generator.generate(&classpath, &symbol, &Cancellation::new()) {
//!     let position = generator.position(&generated, &symbol);
//!     println!("{}:{position}", generated.artifact.path.display());
//! }
//! ```

pub mod error;
mod generate;
mod open;
mod position;

pub use crate::generate::{Generated, SourceGenerator};
pub use crate::open::{Opener, open};
pub use resrc_cache::{Cancellation, Effort};
pub use resrc_navigate::Position;
