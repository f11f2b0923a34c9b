//! Finds where a symbol is declared in regenerated source text.
//!
//! The text is only outlined, never compiled: declarations are recognized by
//! shape, bodies and initializers are skipped. Regenerated code need not be
//! valid, so every failure to resolve degrades to "no position" rather than
//! an error.

mod lexer;
mod outline;
mod position;

pub use crate::outline::{Declaration, DeclarationKind, outline};
pub use crate::position::Position;
use resrc_classpath::SymbolRef;

/// Position of the declaration of `symbol` in `text`.
///
/// Nested classes resolve as deep as the text allows: local and anonymous
/// classes are not declarations, so `a.C$1` resolves to `C`. A member is
/// matched by name, and among overloads by parameter types, then arity; an
/// undeclared constructor resolves to its class. A field reference with no
/// such field falls back to a method of that name.
pub fn locate(text: &str, symbol: &SymbolRef) -> Option<Position> {
    let declarations = outline(text);
    let found = match symbol {
        SymbolRef::Package(_) => None,
        SymbolRef::Module(_) => declarations.iter().find(|d| d.kind == DeclarationKind::Module),
        SymbolRef::Class(name) => find_type(&declarations, &name.nesting()),
        // `C#name` without parentheses may also mean a method.
        SymbolRef::Field { owner, name } => find_type(&declarations, &owner.nesting()).and_then(|ty| {
            ty.members
                .iter()
                .find(|d| d.kind == DeclarationKind::Field && d.name == *name)
                .or_else(|| {
                    ty.members
                        .iter()
                        .find(|d| d.kind == DeclarationKind::Method && d.name == *name)
                })
        }),
        SymbolRef::Method { owner, name, params } => find_type(&declarations, &owner.nesting()).and_then(|ty| {
            let overloads: Vec<&Declaration> = ty
                .members
                .iter()
                .filter(|d| d.kind == DeclarationKind::Method && d.name == *name)
                .collect();
            best_overload(&overloads, params.as_deref())
        }),
        SymbolRef::Constructor { owner, params } => find_type(&declarations, &owner.nesting()).map(|ty| {
            let overloads: Vec<&Declaration> =
                ty.members.iter().filter(|d| d.kind == DeclarationKind::Constructor).collect();
            best_overload(&overloads, params.as_deref()).unwrap_or(ty)
        }),
    };
    let Some(declaration) = found else {
        tracing::debug!(symbol = %symbol, "Declaration not found in generated source");
        return None;
    };
    Some(Position::from_byte_offset(text, declaration.start))
}

// Stops at the first segment that isn't declared as a member type.
fn find_type<'a>(declarations: &'a [Declaration], nesting: &[&str]) -> Option<&'a Declaration> {
    let (first, rest) = nesting.split_first()?;
    let mut current = declarations
        .iter()
        .find(|d| d.kind == DeclarationKind::Type && d.name == *first)?;
    for segment in rest {
        match current
            .members
            .iter()
            .find(|d| d.kind == DeclarationKind::Type && d.name == *segment)
        {
            Some(inner) => current = inner,
            None => break,
        }
    }
    Some(current)
}

fn best_overload<'a>(overloads: &[&'a Declaration], params: Option<&[String]>) -> Option<&'a Declaration> {
    let Some(params) = params else {
        return overloads.first().copied();
    };
    let wanted: Vec<String> = params.iter().map(|p| normalize_type(p)).collect();
    overloads
        .iter()
        .find(|d| d.params.iter().map(|p| normalize_type(p)).eq(wanted.iter().cloned()))
        .or_else(|| overloads.iter().find(|d| d.params.len() == wanted.len()))
        .or_else(|| overloads.first())
        .copied()
}

// `java.util.List<String>` and `List` compare equal, as do `Map$Entry` and
// `Entry`, and `String...` and `String[]`.
fn normalize_type(ty: &str) -> String {
    let mut stripped = String::with_capacity(ty.len());
    let mut depth = 0usize;
    for c in ty.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if depth == 0 && !c.is_whitespace() => stripped.push(c),
            _ => {},
        }
    }
    let stripped = stripped.replace("...", "[]");
    let (base, dimensions) = stripped.split_at(stripped.find('[').unwrap_or(stripped.len()));
    let simple = base.rsplit(['.', '$']).next().unwrap_or(base);
    format!("{simple}{dimensions}")
}
