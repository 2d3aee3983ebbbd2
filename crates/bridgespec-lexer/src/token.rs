//! Token types for the spec lexer.

use bridgespec_types::Span;
use std::fmt;

/// A single token with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Every token kind in the spec language.
///
/// There are no reserved words: declaration kinds such as `spec` or `type`
/// are plain identifiers in statement position.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Names & literals ─────────────────────────────────────

    /// Lower-case identifier, optionally ending in `?` or `!`: `count`, `valid?`
    Identifier(String),
    /// Capitalised segment of a qualified name: `Example`, `Struct`
    Alias(String),
    /// `:ok`, carries the symbol without the colon.
    Atom(String),
    /// `id:` in a keyword pair, carries the key without the colon.
    KeywordKey(String),
    /// `42`
    Integer(i64),
    /// `"text"`
    StringLiteral(String),

    // ── Operators & punctuation ─────────────────────────────

    /// `::`
    ColonColon,
    /// `|`
    Pipe,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `%`
    Percent,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,

    // ── Layout ──────────────────────────────────────────────

    /// End of a declaration. Never emitted inside brackets or after a
    /// token that demands a continuation.
    Newline,
    Eof,
}

impl TokenKind {
    /// Tokens after which a line break does not end the declaration.
    pub fn continues_line(&self) -> bool {
        matches!(
            self,
            TokenKind::Comma
                | TokenKind::Pipe
                | TokenKind::ColonColon
                | TokenKind::Dot
                | TokenKind::Percent
                | TokenKind::KeywordKey(_)
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(name) | TokenKind::Alias(name) => f.write_str(name),
            TokenKind::Atom(name) => write!(f, ":{name}"),
            TokenKind::KeywordKey(name) => write!(f, "{name}:"),
            TokenKind::Integer(value) => write!(f, "{value}"),
            TokenKind::StringLiteral(value) => write!(f, "{value:?}"),
            TokenKind::ColonColon => f.write_str("::"),
            TokenKind::Pipe => f.write_str("|"),
            TokenKind::Dot => f.write_str("."),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Percent => f.write_str("%"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::LBracket => f.write_str("["),
            TokenKind::RBracket => f.write_str("]"),
            TokenKind::LBrace => f.write_str("{"),
            TokenKind::RBrace => f.write_str("}"),
            TokenKind::Newline => f.write_str("newline"),
            TokenKind::Eof => f.write_str("end of file"),
        }
    }
}
