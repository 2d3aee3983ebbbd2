//! Core parser infrastructure: token cursor, error reporting, helpers.

use bridgespec_lexer::token::{Token, TokenKind};
use bridgespec_types::ast::{Declaration, Ident};
use bridgespec_types::{CompileErrors, ErrorCode, SourceFile, Span, SpecError};

/// Deepest expression nesting accepted before the declaration is rejected.
pub const MAX_NESTING_DEPTH: usize = 64;

/// The spec parser.
///
/// Consumes the lexer's token stream and collects declarations in file
/// order. After an error it skips to the next declaration and continues.
pub struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source_file: &'src SourceFile,
    errors: CompileErrors,
    /// Expressions currently being parsed, outermost included.
    pub(crate) depth: usize,
}

/// Result of parsing one spec file.
pub struct ParseResult {
    pub declarations: Vec<Declaration>,
    pub errors: CompileErrors,
}

impl<'src> Parser<'src> {
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: CompileErrors::empty(),
            depth: 0,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    pub(crate) fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    pub(crate) fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.span)
            .unwrap_or_else(|| Span::point(1, 1))
    }

    pub(crate) fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.span,
            None => Span::point(1, 1),
        }
    }

    pub(crate) fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    pub(crate) fn at_line_end(&self) -> bool {
        matches!(self.peek(), TokenKind::Newline | TokenKind::Eof)
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<()> {
        if self.eat(expected) {
            Some(())
        } else {
            self.error_at_current(format!("expected '{}', got '{}'", expected, self.peek()));
            None
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        match self.peek().clone() {
            TokenKind::Identifier(name) => {
                let span = self.current_span();
                self.advance();
                Some(Ident::new(name, span))
            }
            other => {
                self.error_at_current(format!("expected identifier, got '{other}'"));
                None
            }
        }
    }

    /// `Alias { "." Alias }`, returned as its segments.
    pub(crate) fn expect_qualified_name(&mut self) -> Option<Vec<String>> {
        let mut parts = Vec::new();
        loop {
            match self.peek().clone() {
                TokenKind::Alias(segment) => {
                    self.advance();
                    parts.push(segment);
                }
                other => {
                    self.error_at_current(format!("expected module-style name, got '{other}'"));
                    return None;
                }
            }
            if !(self.check(&TokenKind::Dot) && matches!(self.look_ahead(1), TokenKind::Alias(_)))
            {
                return Some(parts);
            }
            self.advance();
        }
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    pub(crate) fn error_at_current(&mut self, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(ErrorCode::UNEXPECTED_TOKEN, message, span);
    }

    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let error = SpecError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(error);
    }

    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.is_full()
    }

    /// Skip to the start of the next declaration.
    pub(crate) fn synchronize(&mut self) {
        while !self.at_end() {
            if self.eat(&TokenKind::Newline) {
                self.skip_newlines();
                return;
            }
            self.advance();
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into declarations, in file order.
    pub fn parse(mut self) -> ParseResult {
        let declarations = self.parse_declarations();
        log::debug!(
            "collected {} declarations from '{}'",
            declarations.len(),
            self.source_file.name
        );
        ParseResult {
            declarations,
            errors: self.errors,
        }
    }
}
