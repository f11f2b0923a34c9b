use crate::{Generated, SourceGenerator};
use resrc_cache::Cancellation;
use resrc_classpath::{ClassPath, SymbolRef};
use resrc_navigate::Position;
use tracing::instrument;

/// Shows a generated file to the user, e.g. in an editor.
pub trait Opener {
    /// Returns whether the file was shown.
    fn open(&self, generated: &Generated, position: Position) -> bool;
}

impl<F> Opener for F
where
    F: Fn(&Generated, Position) -> bool,
{
    fn open(&self, generated: &Generated, position: Position) -> bool {
        self(generated, position)
    }
}

/// Generate the source declaring `symbol` and hand it to `opener`, at the
/// declaration if it can be found. Returns whether anything was opened.
///
/// Cancellation is honoured until the moment the opener is called.
#[instrument(skip_all, fields(symbol = %symbol))]
pub fn open(
    generator: &SourceGenerator,
    classpath: &ClassPath,
    symbol: &SymbolRef,
    cancel: &Cancellation,
    opener: &dyn Opener,
) -> bool {
    let Some(generated) = generator.generate(classpath, symbol, cancel) else {
        return false;
    };
    if cancel.is_cancelled() {
        return false;
    }
    let position = generator.position(&generated, symbol);
    if cancel.is_cancelled() {
        return false;
    }
    tracing::debug!(path = %generated.artifact.path.display(), %position, "Opening generated source");
    opener.open(&generated, position)
}
