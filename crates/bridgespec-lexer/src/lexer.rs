//! Spec lexer: converts source text to a token stream.
//!
//! - `#` comments run to end of line
//! - line breaks become [`TokenKind::Newline`] only at bracket depth zero and
//!   only when the previous token does not demand a continuation
//! - errors are collected (up to [`bridgespec_types::MAX_ERRORS`]) and
//!   scanning resumes at the next character

use bridgespec_types::{CompileErrors, ErrorCode, SourceFile, Span, SpecError};

use crate::token::{Token, TokenKind};

/// The spec lexer.
pub struct Lexer<'src> {
    source: &'src [u8],
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    line: u32,
    col: u32,
    /// Open `(`, `[` and `{` not yet closed.
    depth: u32,
    errors: CompileErrors,
}

/// Result of lexing: tokens plus any errors collected.
pub struct LexResult {
    /// Always ends with [`TokenKind::Eof`].
    pub tokens: Vec<Token>,
    pub errors: CompileErrors,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.source.as_bytes(),
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            depth: 0,
            errors: CompileErrors::empty(),
        }
    }

    /// Lex the entire source file.
    pub fn lex(mut self) -> LexResult {
        let mut tokens: Vec<Token> = Vec::new();

        while !self.errors.is_full() {
            let Some(token) = self.scan_token() else {
                continue;
            };
            if token.kind == TokenKind::Newline {
                let suppressed = match tokens.last() {
                    None => true,
                    Some(prev) => prev.kind == TokenKind::Newline || prev.kind.continues_line(),
                };
                if suppressed || self.depth > 0 {
                    continue;
                }
            }
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }
        log::trace!(
            "lexed '{}' into {} tokens",
            self.source_file.name,
            tokens.len()
        );

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(start_line, start_col, self.line, self.col.saturating_sub(1).max(1))
    }

    fn text_from(&self, start: usize) -> &'src str {
        std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("")
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let err = SpecError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(err);
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                b' ' | b'\t' | b'\r' => {
                    self.advance();
                }
                b'#' => {
                    while self.peek().is_some_and(|c| c != b'\n') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token. `None` means an error was reported and the offending
    /// character skipped.
    fn scan_token(&mut self) -> Option<Token> {
        self.skip_trivia();

        let start = self.pos;
        let start_line = self.line;
        let start_col = self.col;

        let Some(ch) = self.advance() else {
            if self.depth > 0 {
                self.emit_error(
                    ErrorCode::UNCLOSED_DELIMITER,
                    "unclosed bracket at end of file",
                    self.current_span(),
                );
                self.depth = 0;
            }
            return Some(Token::new(TokenKind::Eof, self.current_span()));
        };

        let kind = match ch {
            b'\n' => TokenKind::Newline,
            b'a'..=b'z' | b'_' => {
                self.eat_word();
                self.eat_predicate_suffix();
                let name = self.text_from(start).to_string();
                if self.peek() == Some(b':') && self.peek_at(1) != Some(b':') {
                    self.advance();
                    TokenKind::KeywordKey(name)
                } else {
                    TokenKind::Identifier(name)
                }
            }
            b'A'..=b'Z' => {
                self.eat_word();
                TokenKind::Alias(self.text_from(start).to_string())
            }
            b'0'..=b'9' => return Some(self.scan_integer(start, start_line, start_col)),
            b'"' => return Some(self.scan_string(start_line, start_col)),
            b':' => match self.peek() {
                Some(b':') => {
                    self.advance();
                    TokenKind::ColonColon
                }
                Some(b'a'..=b'z' | b'A'..=b'Z' | b'_') => {
                    let sym_start = self.pos;
                    self.eat_word();
                    self.eat_predicate_suffix();
                    TokenKind::Atom(self.text_from(sym_start).to_string())
                }
                _ => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNEXPECTED_TOKEN,
                        "expected a symbol name or ':' after ':'",
                        span,
                    );
                    return None;
                }
            },
            b'|' => TokenKind::Pipe,
            b'.' => TokenKind::Dot,
            b',' => TokenKind::Comma,
            b'%' => TokenKind::Percent,
            b'(' => self.open(TokenKind::LParen),
            b'[' => self.open(TokenKind::LBracket),
            b'{' => self.open(TokenKind::LBrace),
            b')' => self.close(TokenKind::RParen),
            b']' => self.close(TokenKind::RBracket),
            b'}' => self.close(TokenKind::RBrace),
            other => {
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("unexpected character '{}'", other as char),
                    span,
                );
                return None;
            }
        };

        Some(Token::new(kind, self.span_from(start_line, start_col)))
    }

    fn open(&mut self, kind: TokenKind) -> TokenKind {
        self.depth += 1;
        kind
    }

    fn close(&mut self, kind: TokenKind) -> TokenKind {
        self.depth = self.depth.saturating_sub(1);
        kind
    }

    fn eat_word(&mut self) {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.advance();
        }
    }

    fn eat_predicate_suffix(&mut self) {
        if matches!(self.peek(), Some(b'?' | b'!')) {
            self.advance();
        }
    }

    fn scan_integer(&mut self, start: usize, start_line: u32, start_col: u32) -> Token {
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == b'_') {
            self.advance();
        }
        let span = self.span_from(start_line, start_col);
        let digits: String = self.text_from(start).chars().filter(|&c| c != '_').collect();
        let value = match digits.parse::<i64>() {
            Ok(value) => value,
            Err(_) => {
                self.emit_error(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("integer literal '{digits}' is out of range"),
                    span,
                );
                0
            }
        };
        Token::new(TokenKind::Integer(value), span)
    }

    /// Scan a string literal after its opening quote.
    fn scan_string(&mut self, start_line: u32, start_col: u32) -> Token {
        let mut buf = Vec::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNCLOSED_DELIMITER,
                        "unterminated string literal",
                        span,
                    );
                    break;
                }
                Some(b'"') => {
                    self.advance();
                    break;
                }
                Some(b'\\') => {
                    self.advance();
                    match self.advance() {
                        Some(b'n') => buf.push(b'\n'),
                        Some(b't') => buf.push(b'\t'),
                        Some(other) => buf.push(other),
                        None => {}
                    }
                }
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }
        let value = String::from_utf8_lossy(&buf).into_owned();
        Token::new(
            TokenKind::StringLiteral(value),
            self.span_from(start_line, start_col),
        )
    }
}
