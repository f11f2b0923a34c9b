use crate::{Generated, SourceGenerator};
use resrc_classpath::SymbolRef;
use resrc_navigate::Position;
use tracing::instrument;

impl SourceGenerator {
    /// Where `symbol` is declared in a generated file, re-read from the
    /// cache. Falls back to the start of the file when the declaration can't
    /// be found, or the file can't be read.
    #[instrument(skip_all, fields(path = %generated.artifact.path.display(), symbol = %symbol))]
    pub fn position(&self, generated: &Generated, symbol: &SymbolRef) -> Position {
        let text = match self.cache().read_text(&generated.artifact) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = ?e, "Cannot read generated source");
                return Position::START;
            },
        };
        resrc_navigate::locate(&text, symbol).unwrap_or_else(|| {
            tracing::debug!("Declaration not resolved, using start of file");
            Position::START
        })
    }
}
