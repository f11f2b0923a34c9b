//! Declaration outline of a compilation unit.
//!
//! Only declarations are recognized: types, their fields, enum constants,
//! methods and constructors, and module declarations. Method bodies, field
//! initializers and annotation arguments are skipped as balanced token runs,
//! so local and anonymous classes never show up.

use crate::lexer::{Token, TokenKind, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Module,
    /// Class, interface, enum, record or annotation type.
    Type,
    /// Field or enum constant.
    Field,
    Method,
    Constructor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: String,
    /// Parameter types as written, for methods and constructors.
    pub params: Vec<String>,
    /// Byte offset where the declaration starts, annotations and modifiers
    /// included.
    pub start: usize,
    pub members: Vec<Declaration>,
}

impl Declaration {
    fn new(kind: DeclarationKind, name: impl Into<String>, start: usize) -> Self {
        Self {
            kind,
            name: name.into(),
            params: Vec::new(),
            start,
            members: Vec::new(),
        }
    }
}

/// Top-level declarations of `text`, with their members.
pub fn outline(text: &str) -> Vec<Declaration> {
    let mut parser = Parser {
        text,
        tokens: tokenize(text),
        pos: 0,
    };
    parser.members(None, false)
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<Token> {
        self.tokens.get(self.pos + ahead).copied()
    }

    fn text(&self, token: Token) -> &'a str {
        &self.text[token.start..token.end]
    }

    fn is_punct(&self, ahead: usize, c: char) -> bool {
        self.peek_at(ahead).is_some_and(|t| t.kind == TokenKind::Punct(c))
    }

    fn is_ident(&self, ahead: usize) -> bool {
        self.peek_at(ahead).is_some_and(|t| t.kind == TokenKind::Ident)
    }

    fn is_word(&self, ahead: usize, word: &str) -> bool {
        self.peek_at(ahead).is_some_and(|t| t.kind == TokenKind::Ident && self.text(t) == word)
    }

    /// Declarations up to the `}` closing the current body (consumed), or the
    /// end of input.
    fn members(&mut self, owner: Option<&str>, is_enum: bool) -> Vec<Declaration> {
        let mut members = Vec::new();
        if is_enum {
            self.enum_constants(&mut members);
        }
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Punct('}') => {
                    self.pos += 1;
                    break;
                },
                TokenKind::Punct(';') => self.pos += 1,
                _ => {
                    let before = self.pos;
                    self.member(owner, &mut members);
                    if self.pos == before {
                        self.pos += 1;
                    }
                },
            }
        }
        members
    }

    fn member(&mut self, owner: Option<&str>, out: &mut Vec<Declaration>) {
        let Some(first) = self.peek() else {
            return;
        };
        let start = first.start;
        let mut name: Option<Token> = None;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Punct('@') if self.is_word(1, "interface") && self.is_ident(2) => {
                    self.pos += 2;
                    return self.type_declaration(start, false, out);
                },
                TokenKind::Punct('@') => self.skip_annotation(),
                TokenKind::Ident => {
                    let word = self.text(token);
                    let qualified = self.pos > 0 && self.tokens[self.pos - 1].kind == TokenKind::Punct('.');
                    if !qualified && matches!(word, "class" | "interface" | "enum") && self.is_ident(1) {
                        self.pos += 1;
                        return self.type_declaration(start, word == "enum", out);
                    }
                    if !qualified && word == "record" && self.is_ident(1) && (self.is_punct(2, '(') || self.is_punct(2, '<')) {
                        self.pos += 1;
                        return self.type_declaration(start, false, out);
                    }
                    if owner.is_none() && matches!(word, "package" | "import") {
                        self.skip_statement();
                        return;
                    }
                    if owner.is_none() && word == "module" && self.is_ident(1) {
                        self.pos += 1;
                        return self.module_declaration(start, out);
                    }
                    name = Some(token);
                    self.pos += 1;
                },
                TokenKind::Punct('<') => self.skip_generics(),
                TokenKind::Punct('(') => {
                    let Some(name) = name else {
                        self.skip_balanced('(', ')');
                        continue;
                    };
                    let name = self.text(name);
                    let kind = if Some(name) == owner { DeclarationKind::Constructor } else { DeclarationKind::Method };
                    let mut declaration = Declaration::new(kind, name, start);
                    declaration.params = self.parameters();
                    self.skip_method_rest();
                    out.push(declaration);
                    return;
                },
                TokenKind::Punct('=' | ';' | ',') => {
                    if let Some(name) = name {
                        let name = self.text(name);
                        self.fields(start, name, out);
                    } else {
                        self.skip_statement();
                    }
                    return;
                },
                TokenKind::Punct('{') => {
                    // Initializer block, or a member we can't make sense of.
                    self.skip_balanced('{', '}');
                    return;
                },
                TokenKind::Punct('}') => return,
                _ => self.pos += 1,
            }
        }
    }

    // Positioned on the type's name.
    fn type_declaration(&mut self, start: usize, is_enum: bool, out: &mut Vec<Declaration>) {
        let Some(name) = self.peek() else {
            return;
        };
        self.pos += 1;
        let name = self.text(name);
        let mut declaration = Declaration::new(DeclarationKind::Type, name, start);
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Punct('{') => {
                    self.pos += 1;
                    declaration.members = self.members(Some(name), is_enum);
                    break;
                },
                TokenKind::Punct('(') => self.skip_balanced('(', ')'),
                TokenKind::Punct('@') => self.skip_annotation(),
                TokenKind::Punct(';') => {
                    self.pos += 1;
                    break;
                },
                TokenKind::Punct('}') => break,
                _ => self.pos += 1,
            }
        }
        out.push(declaration);
    }

    // Positioned on the module's (possibly dotted) name.
    fn module_declaration(&mut self, start: usize, out: &mut Vec<Declaration>) {
        let mut name = String::new();
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Ident | TokenKind::Punct('.') => {
                    name.push_str(self.text(token));
                    self.pos += 1;
                },
                _ => break,
            }
        }
        if self.is_punct(0, '{') {
            self.skip_balanced('{', '}');
        }
        out.push(Declaration::new(DeclarationKind::Module, name, start));
    }

    fn enum_constants(&mut self, out: &mut Vec<Declaration>) {
        loop {
            while self.is_punct(0, '@') {
                self.skip_annotation();
            }
            let Some(token) = self.peek() else {
                return;
            };
            match token.kind {
                TokenKind::Ident => {
                    self.pos += 1;
                    out.push(Declaration::new(DeclarationKind::Field, self.text(token), token.start));
                    if self.is_punct(0, '(') {
                        self.skip_balanced('(', ')');
                    }
                    if self.is_punct(0, '{') {
                        self.skip_balanced('{', '}');
                    }
                    if self.is_punct(0, ',') {
                        self.pos += 1;
                    } else {
                        if self.is_punct(0, ';') {
                            self.pos += 1;
                        }
                        return;
                    }
                },
                TokenKind::Punct(';') => {
                    self.pos += 1;
                    return;
                },
                _ => return,
            }
        }
    }

    // Positioned on the `=`, `;` or `,` following the first declarator.
    fn fields(&mut self, start: usize, first: &str, out: &mut Vec<Declaration>) {
        out.push(Declaration::new(DeclarationKind::Field, first, start));
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Punct(';') => {
                    self.pos += 1;
                    return;
                },
                TokenKind::Punct('=') => {
                    self.pos += 1;
                    self.skip_expression();
                },
                TokenKind::Punct(',') => {
                    self.pos += 1;
                    if let Some(next) = self.peek()
                        && next.kind == TokenKind::Ident
                    {
                        out.push(Declaration::new(DeclarationKind::Field, self.text(next), start));
                        self.pos += 1;
                    }
                },
                TokenKind::Punct('}') => return,
                _ => self.pos += 1,
            }
        }
    }

    // Positioned on `(`; consumes through the matching `)`.
    fn parameters(&mut self) -> Vec<String> {
        self.pos += 1;
        let mut params = Vec::new();
        let mut current: Vec<Token> = Vec::new();
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            self.pos += 1;
            match token.kind {
                TokenKind::Punct(')') if depth == 0 => break,
                TokenKind::Punct(',') if depth == 0 => params.push(std::mem::take(&mut current)),
                TokenKind::Punct('(' | '<') => {
                    depth += 1;
                    current.push(token);
                },
                TokenKind::Punct(')' | '>') => {
                    depth = depth.saturating_sub(1);
                    current.push(token);
                },
                _ => current.push(token),
            }
        }
        if !current.is_empty() {
            params.push(current);
        }
        params.iter().filter_map(|tokens| self.parameter_type(tokens)).collect()
    }

    // Drops annotations, `final` and the parameter name. Receiver parameters
    // (`Outer this`) are not real parameters.
    fn parameter_type(&self, tokens: &[Token]) -> Option<String> {
        let mut kept: Vec<Token> = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let token = tokens[i];
            if token.kind == TokenKind::Punct('@') {
                i += 1;
                if i < tokens.len() && tokens[i].kind == TokenKind::Ident {
                    i += 1;
                }
                while i + 1 < tokens.len() && tokens[i].kind == TokenKind::Punct('.') && tokens[i + 1].kind == TokenKind::Ident {
                    i += 2;
                }
                if i < tokens.len() && tokens[i].kind == TokenKind::Punct('(') {
                    let mut depth = 0usize;
                    while i < tokens.len() {
                        match tokens[i].kind {
                            TokenKind::Punct('(') => depth += 1,
                            TokenKind::Punct(')') => depth = depth.saturating_sub(1),
                            _ => {},
                        }
                        i += 1;
                        if depth == 0 {
                            break;
                        }
                    }
                }
                continue;
            }
            if !(token.kind == TokenKind::Ident && self.text(token) == "final") {
                kept.push(token);
            }
            i += 1;
        }
        let name = kept.iter().rposition(|t| t.kind == TokenKind::Ident)?;
        if self.text(kept[name]) == "this" {
            return None;
        }
        let mut ty: String = kept[..name].iter().map(|t| self.text(*t)).collect();
        // C-style array dimensions after the name.
        for token in &kept[name + 1..] {
            if token.kind == TokenKind::Punct('[') {
                ty.push_str("[]");
            }
        }
        (!ty.is_empty()).then_some(ty)
    }

    // After a parameter list: throws clause, then a body, `;`, or an
    // annotation element default.
    fn skip_method_rest(&mut self) {
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Punct('{') => {
                    self.skip_balanced('{', '}');
                    return;
                },
                TokenKind::Punct(';') => {
                    self.pos += 1;
                    return;
                },
                TokenKind::Punct('}') => return,
                TokenKind::Ident if self.text(token) == "default" => {
                    self.pos += 1;
                    self.skip_expression();
                },
                _ => self.pos += 1,
            }
        }
    }

    // Stops before a `,` or `;` that is not nested, or the `}` closing the
    // enclosing body.
    fn skip_expression(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Punct(',' | ';') if depth == 0 => return,
                TokenKind::Punct('}' | ')' | ']') if depth == 0 => return,
                TokenKind::Punct('(' | '[' | '{') => depth += 1,
                TokenKind::Punct(')' | ']' | '}') => depth -= 1,
                _ => {},
            }
            self.pos += 1;
        }
    }

    fn skip_statement(&mut self) {
        while let Some(token) = self.peek() {
            self.pos += 1;
            if token.kind == TokenKind::Punct(';') {
                return;
            }
        }
    }

    // Positioned on `open`; consumes through the matching `close`.
    fn skip_balanced(&mut self, open: char, close: char) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            self.pos += 1;
            match token.kind {
                TokenKind::Punct(c) if c == open => depth += 1,
                TokenKind::Punct(c) if c == close => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                },
                _ => {},
            }
        }
    }

    // Type parameters or arguments. Gives up at anything that can't be part
    // of one, leaving it for the caller.
    fn skip_generics(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Punct('<') => depth += 1,
                TokenKind::Punct('>') => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.pos += 1;
                        return;
                    }
                },
                TokenKind::Punct(';' | '{' | '}' | '(' | ')' | '=') => return,
                _ => {},
            }
            self.pos += 1;
        }
    }

    fn skip_annotation(&mut self) {
        self.pos += 1;
        if self.is_ident(0) {
            self.pos += 1;
        }
        while self.is_punct(0, '.') && self.is_ident(1) {
            self.pos += 2;
        }
        if self.is_punct(0, '(') {
            self.skip_balanced('(', ')');
        }
    }
}
