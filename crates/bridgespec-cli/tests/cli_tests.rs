//! Project-level tests: discovery, configuration, per-file isolation and the
//! on-disk artifact layout.

use std::fs;
use std::path::Path;

use bridgespec_cli::{check_file, discover, ir_file, run_generate, CliError};

const SHARED: &str = r#"
module Shared
interface NIF
type shared_point :: %Shared.Point{x: int, y: int}
spec origin() :: {:ok :: label, point :: shared_point}
"#;

const USER: &str = r#"
module User
spec distance(point :: shared_point) :: {:ok :: label, d :: double}
"#;

const BROKEN: &str = r#"
module Broken
interface NIF
spec f(x :: nonexistent_type) :: :ok
"#;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn test_discover_sorted_and_skips_generated() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "c_src/b/b.bspec", USER);
    write(dir.path(), "c_src/a/a.bspec", SHARED);
    write(dir.path(), "c_src/a/_generated/nif/stale.bspec", SHARED);
    write(dir.path(), "c_src/a/notes.txt", "not a spec");

    let found = discover(dir.path()).unwrap();
    let names: Vec<&str> = found.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(found[0].dir, dir.path().join("c_src/a"));
    assert_eq!(found[0].source, SHARED);
}

#[test]
fn test_generate_writes_layout() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "c_src/a/a.bspec", SHARED);

    let report = run_generate(dir.path()).unwrap();
    assert!(report.is_success());
    assert_eq!(report.generated.len(), 1);

    let generated = &report.generated[0];
    assert_eq!(generated.module, "Shared");
    assert_eq!(generated.backend, "nif");
    let out = dir.path().join("c_src/a/_generated");
    assert_eq!(generated.artifacts.header, out.join("nif/a.h"));
    assert_eq!(generated.artifacts.source, out.join("nif/a.c"));
    let header = fs::read_to_string(out.join("nif/a.h")).unwrap();
    assert!(header.contains("shared_point"));
    assert!(fs::read_to_string(out.join(".gitignore"))
        .unwrap()
        .contains("**/*.c"));
}

#[test]
fn test_aliases_do_not_cross_files() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "c_src/a/a.bspec", SHARED);
    write(dir.path(), "c_src/b/b.bspec", USER);
    write(
        dir.path(),
        "bridgespec.toml",
        "[libs.User]\ninterfaces = [\"cnode\"]\n",
    );

    let report = run_generate(dir.path()).unwrap();
    assert_eq!(report.generated.len(), 1);
    assert_eq!(report.generated[0].module, "Shared");
    assert_eq!(report.failures.len(), 1);
    let message = report.failures[0].to_string();
    assert!(message.contains("unknown type 'shared_point'"), "{message}");
    assert!(!dir.path().join("c_src/b/_generated").exists());
}

#[test]
fn test_ir_agrees_with_generate() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "c_src/a/a.bspec", SHARED);
    write(dir.path(), "c_src/b/b.bspec", USER);

    assert!(ir_file(&dir.path().join("c_src/a/a.bspec")).is_ok());
    let err = ir_file(&dir.path().join("c_src/b/b.bspec")).unwrap_err();
    assert!(matches!(err, CliError::Compile { .. }));
}

#[test]
fn test_failure_does_not_stop_run() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "c_src/a/a.bspec", SHARED);
    write(dir.path(), "c_src/broken/broken.bspec", BROKEN);
    let deep = format!(
        "module Deep\ninterface NIF\nspec f(x :: {}int{}) :: :ok\n",
        "[".repeat(800),
        "]".repeat(800)
    );
    write(dir.path(), "c_src/deep/deep.bspec", &deep);

    let report = run_generate(dir.path()).unwrap();
    assert!(!report.is_success());
    assert_eq!(report.generated.len(), 1);
    assert_eq!(report.failures.len(), 2);
    assert!(!dir.path().join("c_src/broken/_generated").exists());
    assert!(!dir.path().join("c_src/deep/_generated").exists());
}

#[test]
fn test_missing_interface_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "c_src/b/b.bspec", "module Lonely\nspec ping() :: :pong\n");

    let report = run_generate(dir.path()).unwrap();
    assert_eq!(report.failures.len(), 1);
    let message = report.failures[0].to_string();
    assert!(message.contains("Lonely"), "{message}");
}

#[test]
fn test_invalid_config_aborts() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "c_src/a/a.bspec", SHARED);
    write(dir.path(), "bridgespec.toml", "natives = [");

    let err = run_generate(dir.path()).unwrap_err();
    assert!(matches!(err, CliError::Config { .. }));
}

#[test]
fn test_check_file_json() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ok.bspec", SHARED);
    write(dir.path(), "bad.bspec", BROKEN);

    let (ok, json) = check_file(&dir.path().join("ok.bspec")).unwrap();
    assert!(ok);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["total_errors"], 0);

    let (ok, json) = check_file(&dir.path().join("bad.bspec")).unwrap();
    assert!(!ok);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["total_errors"], 1);
    assert!(value["errors"][0]["message"]
        .as_str()
        .unwrap()
        .contains("nonexistent_type"));
}

#[test]
fn test_ir_file_json() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.bspec", SHARED);

    let json = ir_file(&dir.path().join("a.bspec")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["module"], "Shared");
    assert_eq!(value["structs"][0]["alias"], "shared_point");
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ir_file(&dir.path().join("absent.bspec")).unwrap_err();
    assert!(matches!(err, CliError::Io { .. }));
}
