//! Parser tests: declaration collection order, expression shapes for every
//! declaration kind, operator precedence, error recovery and determinism.

use bridgespec_parser::{parse_source, ParseResult, MAX_NESTING_DEPTH};
use bridgespec_types::ast::*;
use bridgespec_types::{ErrorCode, SourceFile};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn parse(source: &str) -> ParseResult {
    let sf = SourceFile::new("test", source);
    parse_source(&sf)
}

/// Parse source and return the declarations, panicking on errors.
fn parse_ok(source: &str) -> Vec<Declaration> {
    let result = parse(source);
    if result.errors.has_errors() {
        for e in &result.errors.errors {
            eprintln!("  ERROR: {} ({})", e.message, e.code);
        }
        panic!("unexpected parse errors (see above)");
    }
    result.declarations
}

/// Parse a single declaration and return its payload rendered back to text.
fn payload_text(source: &str) -> Vec<String> {
    let decls = parse_ok(source);
    assert_eq!(decls.len(), 1, "expected exactly one declaration");
    decls[0].payload.iter().map(|e| e.to_string()).collect()
}

// ─────────────────────────────────────────────────────────────────────
// Collection
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_declarations_kept_in_file_order() {
    let decls = parse_ok(
        r#"
module Example
interface [NIF, CNode]
state_type "MyState"
spec init() :: {:ok :: label, state}
callback :load
"#,
    );
    let kinds: Vec<&str> = decls.iter().map(|d| d.kind.name.as_str()).collect();
    assert_eq!(
        kinds,
        vec!["module", "interface", "state_type", "spec", "callback"]
    );
    assert_eq!(decls[0].kind.span.start_line, 2);
}

#[test]
fn test_empty_file() {
    assert!(parse_ok("").is_empty());
    assert!(parse_ok("# only a comment\n\n").is_empty());
}

#[test]
fn test_declaration_without_payload() {
    let decls = parse_ok("module\n");
    assert_eq!(decls.len(), 1);
    assert!(decls[0].payload.is_empty());
}

// ─────────────────────────────────────────────────────────────────────
// Expression shapes
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_module_qualified_name() {
    let decls = parse_ok("module My.Example.Native");
    assert_eq!(
        decls[0].payload[0].kind,
        ExprKind::Alias(vec!["My".into(), "Example".into(), "Native".into()])
    );
}

#[test]
fn test_spec_precedence() {
    let decls = parse_ok(
        "spec test_example_message(pid :: pid) :: {:ok :: label} | {:error :: label, reason :: atom}",
    );
    let ExprKind::Typed(head, result) = &decls[0].payload[0].kind else {
        panic!("expected a typed node");
    };
    let ExprKind::Call { name, args } = &head.kind else {
        panic!("expected a call head");
    };
    assert_eq!(name.name, "test_example_message");
    assert_eq!(args.len(), 1);
    assert!(matches!(args[0].kind, ExprKind::Typed(_, _)));
    let ExprKind::Alt(first, second) = &result.kind else {
        panic!("expected alternatives on the right of '::'");
    };
    assert!(matches!(first.kind, ExprKind::Tuple(ref items) if items.len() == 1));
    assert!(matches!(second.kind, ExprKind::Tuple(ref items) if items.len() == 2));
}

#[test]
fn test_alternatives_are_right_associative() {
    let decls = parse_ok("type e :: :a | :b | :c");
    let ExprKind::Typed(_, rhs) = &decls[0].payload[0].kind else {
        panic!("expected a typed node");
    };
    let ExprKind::Alt(a, rest) = &rhs.kind else {
        panic!("expected alternatives");
    };
    assert_eq!(a.as_atom(), Some("a"));
    assert!(matches!(rest.kind, ExprKind::Alt(_, _)));
}

#[test]
fn test_struct_type_payload() {
    assert_eq!(
        payload_text("type my_struct :: %My.Struct{id: int, data: [int], name: string}"),
        vec!["my_struct :: %My.Struct{id: int, data: [int], name: string}"]
    );
}

#[test]
fn test_empty_struct_literal() {
    assert_eq!(payload_text("type empty :: %Empty{}"), vec!["empty :: %Empty{}"]);
}

#[test]
fn test_dirty_trailing_keyword_list() {
    let decls = parse_ok("dirty :cpu, foo: 1, bar: 2");
    let payload = &decls[0].payload;
    assert_eq!(payload.len(), 2);
    assert_eq!(payload[0].as_atom(), Some("cpu"));
    let ExprKind::Keyword(pairs) = &payload[1].kind else {
        panic!("expected keyword list");
    };
    let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.name.as_str()).collect();
    assert_eq!(keys, vec!["foo", "bar"]);
    assert_eq!(pairs[1].1.kind, ExprKind::Int(2));
}

#[test]
fn test_dirty_bracketed_keyword_list() {
    assert_eq!(
        payload_text("dirty :io, [foo: 1, bar: 0]"),
        vec![":io", "[foo: 1, bar: 0]"]
    );
}

#[test]
fn test_callback_with_function_name() {
    assert_eq!(
        payload_text("callback :upgrade, :on_upgrade"),
        vec![":upgrade", ":on_upgrade"]
    );
}

#[test]
fn test_multiline_declaration() {
    let decls = parse_ok(
        "spec foo(\n  a :: int,\n  b :: [int]\n) ::\n  {:ok :: label, a} |\n  {:error :: label}\nsends {:msg :: label}\n",
    );
    assert_eq!(decls.len(), 2);
    assert_eq!(decls[1].kind.name, "sends");
    assert_eq!(decls[0].span.start_line, 1);
    assert_eq!(decls[0].span.end_line, 6);
}

// ─────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_declaration_must_start_with_identifier() {
    let result = parse(":ok\nmodule Example\n");
    assert_eq!(result.errors.total_errors, 1);
    assert_eq!(result.declarations.len(), 1);
    assert_eq!(result.declarations[0].kind.name, "module");
}

#[test]
fn test_recovers_at_next_declaration() {
    let result = parse("spec foo( :: int)\ncallback :load\nspec bar() :: :ok :ok\n");
    assert_eq!(result.errors.total_errors, 2);
    assert!(result
        .declarations
        .iter()
        .any(|d| d.kind.name == "callback"));
}

#[test]
fn test_trailing_garbage_is_reported() {
    let result = parse("module Example Other\n");
    assert_eq!(result.errors.total_errors, 1);
    assert!(result.errors.errors[0]
        .message
        .contains("expected end of declaration"));
}

fn nested_list_spec(depth: usize) -> String {
    format!(
        "spec f(x :: {}int{}) :: :ok",
        "[".repeat(depth),
        "]".repeat(depth)
    )
}

#[test]
fn test_deep_nesting_is_an_error() {
    let source = format!("{}\ncallback :load\n", nested_list_spec(800));
    let result = parse(&source);
    assert_eq!(result.errors.total_errors, 1);
    let error = &result.errors.errors[0];
    assert_eq!(error.code, ErrorCode::NESTING_TOO_DEEP);
    assert!(error.message.contains("nested deeper than"));
    assert_eq!(result.declarations.len(), 1);
    assert_eq!(result.declarations[0].kind.name, "callback");
}

#[test]
fn test_nesting_below_limit_parses() {
    let decls = parse_ok(&nested_list_spec(MAX_NESTING_DEPTH - 8));
    assert_eq!(decls.len(), 1);
}

#[test]
fn test_lex_errors_stop_before_parsing() {
    let result = parse("module $Example\n");
    assert!(result.errors.has_errors());
    assert!(result.declarations.is_empty());
}

#[test]
fn test_parser_determinism_100_iterations() {
    let source = "module Example\nspec f(a, [b]) :: {:ok :: label, a} | {:error :: label}\ndirty :cpu, f: 2\n";
    let first = parse_ok(source);
    for i in 0..100 {
        assert_eq!(first, parse_ok(source), "Determinism failure at iteration {i}");
    }
}
