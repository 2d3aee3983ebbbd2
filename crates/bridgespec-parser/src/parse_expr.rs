//! Expression parsing.
//!
//! ```ebnf
//! Expr    = Alt [ "::" Expr ] ;
//! Alt     = Primary [ "|" Alt ] ;
//! Primary = identifier [ "(" Items ")" ]
//!         | Alias { "." Alias }
//!         | atom | integer | string
//!         | "[" Items "]" | "{" Items "}"
//!         | "%" QualifiedName "{" [ KeywordList ] "}" ;
//! Items   = [ Expr { "," Expr } ] [ "," KeywordList ] | KeywordList ;
//! ```
//!
//! Both `::` and `|` are right-associative, and `|` binds tighter, so
//! `f() :: {:a} | {:b}` is `f() :: ({:a} | {:b})`. Nesting deeper than
//! [`MAX_NESTING_DEPTH`] is an error.

use bridgespec_lexer::token::TokenKind;
use bridgespec_types::ast::{Expr, ExprKind, Ident};
use bridgespec_types::ErrorCode;

use crate::parser::{Parser, MAX_NESTING_DEPTH};

impl<'src> Parser<'src> {
    pub(crate) fn parse_expr(&mut self) -> Option<Expr> {
        if self.depth >= MAX_NESTING_DEPTH {
            self.error_at(
                ErrorCode::NESTING_TOO_DEEP,
                format!("expression nested deeper than {MAX_NESTING_DEPTH} levels"),
                self.current_span(),
            );
            return None;
        }
        self.depth += 1;
        let expr = self.parse_typed();
        self.depth -= 1;
        expr
    }

    fn parse_typed(&mut self) -> Option<Expr> {
        let lhs = self.parse_alt()?;
        if self.eat(&TokenKind::ColonColon) {
            let rhs = self.parse_expr()?;
            let span = lhs.span.merge(rhs.span);
            return Some(Expr::new(ExprKind::Typed(Box::new(lhs), Box::new(rhs)), span));
        }
        Some(lhs)
    }

    fn parse_alt(&mut self) -> Option<Expr> {
        let lhs = self.parse_primary()?;
        if self.eat(&TokenKind::Pipe) {
            let rhs = self.parse_alt()?;
            let span = lhs.span.merge(rhs.span);
            return Some(Expr::new(ExprKind::Alt(Box::new(lhs), Box::new(rhs)), span));
        }
        Some(lhs)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let kind = match self.peek().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                if self.eat(&TokenKind::LParen) {
                    let args = self.parse_items(&TokenKind::RParen)?;
                    ExprKind::Call {
                        name: Ident::new(name, start),
                        args,
                    }
                } else {
                    ExprKind::Ident(name)
                }
            }
            TokenKind::Alias(_) => ExprKind::Alias(self.expect_qualified_name()?),
            TokenKind::Atom(name) => {
                self.advance();
                ExprKind::Atom(name)
            }
            TokenKind::Integer(value) => {
                self.advance();
                ExprKind::Int(value)
            }
            TokenKind::StringLiteral(value) => {
                self.advance();
                ExprKind::Str(value)
            }
            TokenKind::LBracket => {
                self.advance();
                ExprKind::List(self.parse_items(&TokenKind::RBracket)?)
            }
            TokenKind::LBrace => {
                self.advance();
                ExprKind::Tuple(self.parse_items(&TokenKind::RBrace)?)
            }
            TokenKind::Percent => {
                self.advance();
                let alias = self.expect_qualified_name()?;
                self.expect(&TokenKind::LBrace)?;
                let entries = if self.check(&TokenKind::RBrace) {
                    Vec::new()
                } else {
                    self.parse_pairs(&TokenKind::RBrace)?
                };
                self.expect(&TokenKind::RBrace)?;
                ExprKind::Map { alias, entries }
            }
            TokenKind::Newline | TokenKind::Eof => {
                self.error_at(
                    ErrorCode::UNEXPECTED_TOKEN,
                    "unexpected end of declaration",
                    start,
                );
                return None;
            }
            other => {
                self.error_at_current(format!("expected expression, got '{other}'"));
                return None;
            }
        };
        let span = start.merge(self.previous_span());
        Some(Expr::new(kind, span))
    }

    /// Comma-separated items up to and including `close`. A run of keyword
    /// pairs becomes a single trailing [`ExprKind::Keyword`] item.
    fn parse_items(&mut self, close: &TokenKind) -> Option<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.check(close) {
            if matches!(self.peek(), TokenKind::KeywordKey(_)) {
                items.push(self.parse_keyword_list(close)?);
                break;
            }
            items.push(self.parse_expr()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(close)?;
        Some(items)
    }

    /// `key: Expr { "," key: Expr }` as one expression node.
    pub(crate) fn parse_keyword_list(&mut self, close: &TokenKind) -> Option<Expr> {
        let start = self.current_span();
        let pairs = self.parse_pairs(close)?;
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::Keyword(pairs), span))
    }

    /// Keyword pairs, stopping before `close` (or at the end of the line).
    fn parse_pairs(&mut self, close: &TokenKind) -> Option<Vec<(Ident, Expr)>> {
        let mut pairs = Vec::new();
        loop {
            let key = match self.peek().clone() {
                TokenKind::KeywordKey(name) => {
                    let span = self.current_span();
                    self.advance();
                    Ident::new(name, span)
                }
                other => {
                    self.error_at_current(format!("expected 'key:', got '{other}'"));
                    return None;
                }
            };
            let value = self.parse_expr()?;
            pairs.push((key, value));
            if self.check(close) || self.at_line_end() || !self.eat(&TokenKind::Comma) {
                return Some(pairs);
            }
        }
    }
}
