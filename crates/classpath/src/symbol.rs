//! Symbolic references to declarations in compiled code.
//!
//! Textual syntax:
//!
//! | reference | meaning |
//! |---|---|
//! | `a.b.C`, `a/b/C$Inner` | a class or interface |
//! | `a.b.C#field` | a field or enum constant |
//! | `a.b.C#method(int, String)` | a method; `#method()` has no parameters |
//! | `a.b.C#<init>(int)` | a constructor |
//! | `module:java.base` | a module descriptor |
//! | `package:a.b` | a package (never regenerable) |
//!
//! A method or constructor without a parameter list matches any overload.

use crate::BinaryName;
use crate::error::{ErrorKind, Result};
use std::fmt;
use std::str::FromStr;

const CONSTRUCTOR: &str = "<init>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Package,
    Module,
    Class,
    Field,
    Method,
    Constructor,
}

impl SymbolKind {
    /// Packages don't correspond to a single compiled unit.
    pub fn is_regenerable(self) -> bool {
        !matches!(self, Self::Package)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolRef {
    Package(String),
    Module(String),
    Class(BinaryName),
    Field {
        owner: BinaryName,
        name: String,
    },
    Method {
        owner: BinaryName,
        name: String,
        params: Option<Vec<String>>,
    },
    Constructor {
        owner: BinaryName,
        params: Option<Vec<String>>,
    },
}

impl SymbolRef {
    pub fn kind(&self) -> SymbolKind {
        match self {
            Self::Package(_) => SymbolKind::Package,
            Self::Module(_) => SymbolKind::Module,
            Self::Class(_) => SymbolKind::Class,
            Self::Field { .. } => SymbolKind::Field,
            Self::Method { .. } => SymbolKind::Method,
            Self::Constructor { .. } => SymbolKind::Constructor,
        }
    }

    /// Class the symbol is declared in (the class itself for classes).
    pub fn owner(&self) -> Option<&BinaryName> {
        match self {
            Self::Package(_) | Self::Module(_) => None,
            Self::Class(owner)
            | Self::Field { owner, .. }
            | Self::Method { owner, .. }
            | Self::Constructor { owner, .. } => Some(owner),
        }
    }

    /// The compiled unit that has to be regenerated to show this symbol: the
    /// outermost class enclosing it, or the module descriptor.
    pub fn binary_name(&self) -> Result<BinaryName> {
        match self {
            Self::Package(name) => exn::bail!(ErrorKind::UnsupportedSymbol(format!("package {name}"))),
            Self::Module(_) => Ok(BinaryName::module_info()),
            _ => self.owner().map(BinaryName::outermost).ok_or_else(|| exn::Exn::from(ErrorKind::InvalidSymbol(self.to_string()))),
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let invalid = || ErrorKind::InvalidSymbol(input.to_string());
        if let Some(name) = input.strip_prefix("package:") {
            let name = name.trim();
            if name.is_empty() {
                exn::bail!(invalid());
            }
            return Ok(Self::Package(name.to_string()));
        }
        if let Some(name) = input.strip_prefix("module:") {
            let name = name.trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                exn::bail!(invalid());
            }
            return Ok(Self::Module(name.to_string()));
        }
        let Some((owner, member)) = input.split_once('#') else {
            return Ok(Self::Class(BinaryName::parse(input).map_err(|_| exn::Exn::from(invalid()))?));
        };
        let owner = BinaryName::parse(owner).map_err(|_| exn::Exn::from(invalid()))?;
        let (name, params) = match member.split_once('(') {
            Some((name, rest)) => {
                let Some(list) = rest.trim_end().strip_suffix(')') else {
                    exn::bail!(invalid());
                };
                (name.trim(), Some(parse_params(list).ok_or_else(invalid)?))
            },
            None => (member.trim(), None),
        };
        if !is_member_name(name) {
            exn::bail!(invalid());
        }
        Ok(match (name, params) {
            (CONSTRUCTOR, params) => Self::Constructor { owner, params },
            (name, None) => Self::Field {
                owner,
                name: name.to_string(),
            },
            (name, params) => Self::Method {
                owner,
                name: name.to_string(),
                params,
            },
        })
    }
}

// Splits on top-level commas only, generic arguments stay intact.
fn parse_params(list: &str) -> Option<Vec<String>> {
    if list.trim().is_empty() {
        return Some(Vec::new());
    }
    let mut params = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in list.chars() {
        match c {
            '<' => {
                depth += 1;
                current.push(c);
            },
            '>' => {
                depth = depth.checked_sub(1)?;
                current.push(c);
            },
            ',' if depth == 0 => params.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    params.push(current);
    let params: Vec<String> = params.into_iter().map(|p| p.trim().to_string()).collect();
    if depth != 0 || params.iter().any(String::is_empty) {
        return None;
    }
    Some(params)
}

fn is_member_name(name: &str) -> bool {
    name == CONSTRUCTOR
        || (!name.is_empty()
            && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$')
            && !name.starts_with(|c: char| c.is_ascii_digit()))
}

impl FromStr for SymbolRef {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = |p: &Option<Vec<String>>| p.as_ref().map(|p| format!("({})", p.join(", "))).unwrap_or_default();
        match self {
            Self::Package(name) => write!(f, "package:{name}"),
            Self::Module(name) => write!(f, "module:{name}"),
            Self::Class(owner) => write!(f, "{}", owner.dotted()),
            Self::Field { owner, name } => write!(f, "{}#{name}", owner.dotted()),
            Self::Method { owner, name, params: p } => write!(f, "{}#{name}{}", owner.dotted(), params(p)),
            Self::Constructor { owner, params: p } => write!(f, "{}#{CONSTRUCTOR}{}", owner.dotted(), params(p)),
        }
    }
}
