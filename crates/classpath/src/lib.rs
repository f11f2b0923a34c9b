//! Class path model: where compiled classes live and how to find them.
//!
//! A [`ClassPath`] is an ordered list of [`BinaryRoot`]s (directories or
//! jar/zip archives). Looking up a [`BinaryName`] walks the roots in order and
//! the first root holding `<name>.class` wins.

mod classpath;
pub mod error;
mod name;
mod root;
mod symbol;

pub use crate::classpath::{ClassPath, ResourceBytes};
pub use crate::name::BinaryName;
pub use crate::root::BinaryRoot;
pub use crate::symbol::{SymbolKind, SymbolRef};

/// Suffix of compiled class resources.
pub const CLASS_SUFFIX: &str = ".class";
