//! Just enough of a Java tokenizer to find declarations: comments and the
//! contents of string, character and text block literals never produce
//! tokens that could be mistaken for structure.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident,
    Punct(char),
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    /// Byte offsets into the source.
    pub(crate) start: usize,
    pub(crate) end: usize,
}

pub(crate) fn tokenize(text: &str) -> Vec<Token> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        match c {
            c if c.is_whitespace() => {},
            '/' if next == Some('/') => {
                while chars.next_if(|&(_, n)| n != '\n').is_some() {}
            },
            '/' if next == Some('*') => {
                chars.next();
                let mut previous = '\0';
                for (_, n) in chars.by_ref() {
                    if previous == '*' && n == '/' {
                        break;
                    }
                    previous = n;
                }
            },
            '"' if bytes.get(start + 1..start + 3) == Some(b"\"\"") => {
                chars.next();
                chars.next();
                let end = skip_text_block(&mut chars, text.len());
                tokens.push(Token { kind: TokenKind::Literal, start, end });
            },
            '"' | '\'' => {
                let end = skip_quoted(&mut chars, c, text.len());
                tokens.push(Token { kind: TokenKind::Literal, start, end });
            },
            c if is_ident_start(c) => {
                let mut end = start + c.len_utf8();
                while let Some((i, n)) = chars.next_if(|&(_, n)| is_ident_part(n)) {
                    end = i + n.len_utf8();
                }
                tokens.push(Token { kind: TokenKind::Ident, start, end });
            },
            c if c.is_ascii_digit() => {
                let mut end = start + 1;
                while let Some((i, n)) = chars.next_if(|&(_, n)| n.is_ascii_alphanumeric() || n == '_' || n == '.') {
                    end = i + n.len_utf8();
                }
                tokens.push(Token { kind: TokenKind::Literal, start, end });
            },
            c => tokens.push(Token {
                kind: TokenKind::Punct(c),
                start,
                end: start + c.len_utf8(),
            }),
        }
    }
    tokens
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

type Chars<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

// Ends at the closing quote, or the end of the line for unterminated literals.
fn skip_quoted(chars: &mut Chars<'_>, quote: char, len: usize) -> usize {
    while let Some((i, n)) = chars.next() {
        match n {
            '\\' => {
                chars.next();
            },
            '\n' => return i,
            n if n == quote => return i + 1,
            _ => {},
        }
    }
    len
}

fn skip_text_block(chars: &mut Chars<'_>, len: usize) -> usize {
    let mut quotes = 0;
    while let Some((i, n)) = chars.next() {
        match n {
            '\\' => {
                quotes = 0;
                chars.next();
            },
            '"' => {
                quotes += 1;
                if quotes == 3 {
                    return i + 1;
                }
            },
            _ => quotes = 0,
        }
    }
    len
}
