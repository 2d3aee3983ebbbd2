//! Lexer tests: names, symbols, keyword keys, layout rules, comments,
//! error recovery and determinism.

use bridgespec_lexer::{Lexer, TokenKind};
use bridgespec_types::SourceFile;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Lex source text and return the token kinds, excluding the final Eof.
fn kinds(source: &str) -> Vec<TokenKind> {
    let sf = SourceFile::new("test", source);
    Lexer::new(&sf)
        .lex()
        .tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.kind)
        .collect()
}

fn error_messages(source: &str) -> Vec<String> {
    let sf = SourceFile::new("test", source);
    Lexer::new(&sf)
        .lex()
        .errors
        .errors
        .into_iter()
        .map(|e| e.message)
        .collect()
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Identifier(name.to_string())
}

fn atom(name: &str) -> TokenKind {
    TokenKind::Atom(name.to_string())
}

// ─────────────────────────────────────────────────────────────────────
// Names and literals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_identifiers_aliases_and_atoms() {
    assert_eq!(
        kinds("module My.Example"),
        vec![
            ident("module"),
            TokenKind::Alias("My".into()),
            TokenKind::Dot,
            TokenKind::Alias("Example".into()),
        ]
    );
    assert_eq!(kinds(":ok :error"), vec![atom("ok"), atom("error")]);
    assert_eq!(kinds("valid? reset!"), vec![ident("valid?"), ident("reset!")]);
}

#[test]
fn test_typed_operator_vs_keyword_key() {
    assert_eq!(
        kinds("pid :: pid"),
        vec![ident("pid"), TokenKind::ColonColon, ident("pid")]
    );
    assert_eq!(
        kinds("a::int"),
        vec![ident("a"), TokenKind::ColonColon, ident("int")]
    );
    assert_eq!(
        kinds("foo: 1"),
        vec![TokenKind::KeywordKey("foo".into()), TokenKind::Integer(1)]
    );
}

#[test]
fn test_string_and_integer_literals() {
    assert_eq!(
        kinds(r#"state_type "My\"State" 1_000"#),
        vec![
            ident("state_type"),
            TokenKind::StringLiteral("My\"State".into()),
            TokenKind::Integer(1000),
        ]
    );
}

#[test]
fn test_struct_literal_tokens() {
    assert_eq!(
        kinds("%S{id: int, data: [int]}"),
        vec![
            TokenKind::Percent,
            TokenKind::Alias("S".into()),
            TokenKind::LBrace,
            TokenKind::KeywordKey("id".into()),
            ident("int"),
            TokenKind::Comma,
            TokenKind::KeywordKey("data".into()),
            TokenKind::LBracket,
            ident("int"),
            TokenKind::RBracket,
            TokenKind::RBrace,
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Layout
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_newlines_separate_declarations() {
    assert_eq!(
        kinds("\n\ncallback :load\n\n\ncallback :unload\n"),
        vec![
            ident("callback"),
            atom("load"),
            TokenKind::Newline,
            ident("callback"),
            atom("unload"),
            TokenKind::Newline,
        ]
    );
}

#[test]
fn test_newlines_inside_brackets_are_dropped() {
    let ks = kinds("spec foo(\n  a,\n  b\n) :: :ok\n");
    assert_eq!(ks.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
    assert_eq!(ks.last(), Some(&TokenKind::Newline));
}

#[test]
fn test_trailing_operator_continues_line() {
    let ks = kinds("type e :: :a |\n  :b |\n  :c\n");
    assert_eq!(ks.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
    let ks = kinds("spec f() ::\n  :ok\n");
    assert_eq!(ks.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
}

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        kinds("# header\nmodule Example # trailing\n"),
        vec![
            ident("module"),
            TokenKind::Alias("Example".into()),
            TokenKind::Newline,
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_unexpected_character_recovers() {
    let sf = SourceFile::new("test", "spec foo() :: $ :ok");
    let result = Lexer::new(&sf).lex();
    assert_eq!(result.errors.total_errors, 1);
    assert!(result.errors.errors[0].message.contains("'$'"));
    assert!(result
        .tokens
        .iter()
        .any(|t| t.kind == TokenKind::Atom("ok".into())));
}

#[test]
fn test_unterminated_string() {
    assert_eq!(
        error_messages("state_type \"Open\n"),
        vec!["unterminated string literal".to_string()]
    );
}

#[test]
fn test_unclosed_bracket() {
    assert_eq!(
        error_messages("spec foo(a, b"),
        vec!["unclosed bracket at end of file".to_string()]
    );
}

#[test]
fn test_error_cap() {
    let source = "$".repeat(40);
    let sf = SourceFile::new("test", source.as_str());
    let result = Lexer::new(&sf).lex();
    assert_eq!(result.errors.total_errors, bridgespec_types::MAX_ERRORS);
    assert_eq!(result.tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
}

#[test]
fn test_spans_are_one_based() {
    let sf = SourceFile::new("test", "module Example\nsends :msg");
    let tokens = Lexer::new(&sf).lex().tokens;
    let atom = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Atom("msg".into()))
        .unwrap();
    assert_eq!(atom.span.start_line, 2);
    assert_eq!(atom.span.start_col, 7);
    assert_eq!(atom.span.end_col, 10);
}

#[test]
fn test_lexer_determinism_100_iterations() {
    let source = "module Example\nspec foo(a :: [int]) :: {:ok :: label, a} | :error\n";
    let first = kinds(source);
    for i in 0..100 {
        assert_eq!(first, kinds(source), "Determinism failure at iteration {i}");
    }
}
