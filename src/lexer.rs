//! Single-pass scanner turning source text into [`Token`]s.
//!
//! Rule order mirrors the language definition: comments, strings, numbers,
//! identifiers, single-character punctuation, end-of-line. Spaces and tabs are
//! discarded. Multi-character operators (`<=`, `>=`, `!=`) are *not* lexed
//! here; the parser glues consecutive punctuation together.

use crate::error::ParseError;
use logos::Logos;
use std::fmt;

/// A location in the source text. Lines and columns are 1-based.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    /// Byte offset from the start of the source.
    pub offset: usize,
    /// Line number; `\n`, `\r` and `\r\n` each end a line.
    pub line: usize,
    /// Column in characters, not bytes.
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The classified payload of a token.
#[derive(Logos, Clone, Debug, PartialEq)]
#[logos(skip r"[ \t]+")]
pub enum TokenKind {
    /// `REM ...` or `# ...` up to (not including) the end of the line.
    #[regex(r"(?i)rem([^A-Za-z0-9_\n\r][^\n\r]*)?", comment_text, priority = 10)]
    #[regex(r"#[^\n\r]*", comment_text)]
    Comment(String),

    /// Double-quoted string, unquoted. `\"` embeds a quote.
    #[regex(r#""(\\"|[^"])*""#, unquote)]
    Str(String),

    /// Numeric literal, optionally signed: `10`, `-3`, `.5`, `+2.25`.
    #[regex(r"[-+]?([0-9]*\.)?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    /// Identifier or keyword. Keywords are matched case-insensitively by the parser.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[-\[\]!@$%^&*()+={}|:;'<,>.?/]", |lex| lex.slice().chars().next())]
    Punct(char),

    /// One or more consecutive newline / carriage-return characters.
    #[regex(r"[\n\r]+")]
    Eol,
}

impl TokenKind {
    /// Returns true for the given single punctuation character.
    pub fn is_punct(&self, c: char) -> bool {
        matches!(self, Self::Punct(p) if *p == c)
    }

    /// Returns true if this is an identifier spelling `keyword` (ASCII case-insensitive).
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Self::Ident(name) if name.eq_ignore_ascii_case(keyword))
    }
}

/// An immutable lexeme with its classification and source position.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// What the scanner recognised.
    pub kind: TokenKind,
    /// The raw source slice the token was scanned from.
    pub lexeme: String,
    /// Where the token starts.
    pub pos: Position,
}

fn comment_text(lex: &mut logos::Lexer<TokenKind>) -> String {
    let slice = lex.slice();
    let body = match slice.strip_prefix('#') {
        Some(rest) => rest,
        None => &slice[3..],
    };
    body.trim().to_string()
}

fn unquote(lex: &mut logos::Lexer<TokenKind>) -> String {
    let inner = &lex.slice()[1..lex.slice().len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Maps byte offsets back to line/column pairs.
struct LineIndex<'a> {
    source: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(source: &'a str) -> Self {
        let bytes = source.as_bytes();
        let mut starts = vec![0];
        for (i, &byte) in bytes.iter().enumerate() {
            match byte {
                b'\n' => starts.push(i + 1),
                // A lone CR ends a line; in CRLF the LF does.
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => starts.push(i + 1),
                _ => {}
            }
        }
        Self { source, starts }
    }

    fn position(&self, offset: usize) -> Position {
        let line = self.starts.partition_point(|&start| start <= offset);
        let start = self.starts[line - 1];
        let column = self.source[start..offset].chars().count() + 1;
        Position {
            offset,
            line,
            column,
        }
    }
}

/// Scans the whole of `source`, failing on the first character no rule accepts.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let lines = LineIndex::new(source);
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let pos = lines.position(lexer.span().start);
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                lexeme: lexer.slice().to_string(),
                pos,
            }),
            Err(()) => {
                return Err(ParseError::new(
                    pos,
                    format!("unexpected input {:?}", lexer.slice()),
                ));
            }
        }
    }

    Ok(tokens)
}

/// The position just past the last character of `source`.
pub(crate) fn end_position(source: &str) -> Position {
    LineIndex::new(source).position(source.len())
}
