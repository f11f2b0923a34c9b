//! Driving a source regeneration engine.
//!
//! The engine itself is a black box behind [`Decompiler`]: it receives the
//! bytes and binary name of one class, can fetch further class files through a
//! [`ClassFileSource`], and reports everything it produces to a
//! [`ResultCollector`].

mod command;
pub mod error;
mod sink;
mod source;

pub use crate::command::{CLASS_PLACEHOLDER, CommandDecompiler, DIR_PLACEHOLDER, NAME_PLACEHOLDER};
use crate::error::Result;
pub use crate::sink::{
    Decompiled, Diagnostic, Output, RegenerationResult, ResultCollector, Severity, SinkClass, SinkType, negotiate,
    preferences,
};
pub use crate::source::{ClassFileSource, Companion};
use resrc_classpath::BinaryName;

/// A source regeneration engine.
///
/// Problems the engine can describe (a class it could not parse, a missing
/// dependency) belong in the collector as diagnostics; `Err` is reserved for
/// failing to run the engine at all.
pub trait Decompiler: Send + Sync {
    fn name(&self) -> &str;

    fn decompile(
        &self,
        bytes: &[u8],
        name: &BinaryName,
        source: &dyn ClassFileSource,
        sink: &mut ResultCollector,
    ) -> Result<()>;
}
