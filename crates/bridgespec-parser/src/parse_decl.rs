//! Declaration-level parsing.
//!
//! ```ebnf
//! File        = { Declaration Newline } ;
//! Declaration = identifier [ Payload ] ;
//! Payload     = Expr { "," Expr } [ "," KeywordList ] | KeywordList ;
//! ```

use bridgespec_lexer::token::TokenKind;
use bridgespec_types::ast::Declaration;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    pub(crate) fn parse_declarations(&mut self) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        self.skip_newlines();

        while !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            match self.parse_declaration() {
                Some(decl) if self.at_line_end() => {
                    declarations.push(decl);
                    self.skip_newlines();
                }
                Some(_) => {
                    self.error_at_current(format!(
                        "expected end of declaration, got '{}'",
                        self.peek()
                    ));
                    self.synchronize();
                }
                None => self.synchronize(),
            }
        }

        declarations
    }

    fn parse_declaration(&mut self) -> Option<Declaration> {
        let start = self.current_span();
        let kind = self.expect_identifier()?;

        let mut payload = Vec::new();
        while !self.at_line_end() {
            if matches!(self.peek(), TokenKind::KeywordKey(_)) {
                payload.push(self.parse_keyword_list(&TokenKind::Newline)?);
                break;
            }
            payload.push(self.parse_expr()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        let span = start.merge(self.previous_span());
        Some(Declaration {
            kind,
            payload,
            span,
        })
    }
}
