//! bridgespec parser: collects the raw declarations of one spec file.
//!
//! The parser knows nothing about what a `spec` or a `dirty` declaration
//! means. It produces an ordered list of
//! [`Declaration`](bridgespec_types::ast::Declaration)s whose payloads are
//! generic expression trees; the compiler gives them meaning.

mod parse_decl;
mod parse_expr;
mod parser;

pub use parser::{ParseResult, Parser, MAX_NESTING_DEPTH};

use bridgespec_lexer::Lexer;
use bridgespec_types::SourceFile;

/// Lex and parse a source file in one step.
pub fn parse_source(source_file: &SourceFile) -> ParseResult {
    let lexed = Lexer::new(source_file).lex();
    if lexed.errors.has_errors() {
        return ParseResult {
            declarations: Vec::new(),
            errors: lexed.errors,
        };
    }
    Parser::new(lexed.tokens, source_file).parse()
}
