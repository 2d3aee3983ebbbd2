//! bridgespec compiler: orchestrates the full pipeline for one spec file.
//!
//! ```text
//! .bspec source → Lexer → Parser → Normalizer → Resolver → Indexer → Specs → Backend
//! ```
//!
//! Every stage after parsing stops at the first [`DeclError`]. Spec files
//! share no state, so callers may compile many files in parallel.

pub mod error;
pub mod normalize;
pub mod registry;
pub mod resolve;
pub mod results;
pub mod select;

use std::path::Path;

use serde::{Deserialize, Serialize};

use bridgespec_parser::parse_source;
use bridgespec_types::ast::Declaration;
use bridgespec_types::ir::Specs;
use bridgespec_types::{CompileErrors, GeneratedCode, SourceFile};

pub use error::{DeclError, DeclResult};
pub use registry::{build_specs, SpecsBuilder};
pub use select::{
    canonical_backend, select_backend_name, BackendRegistry, ConfigCategory, NoProjectConfig,
    ProjectConfig, StaticProjectConfig,
};

/// File suffix of spec sources.
pub const SPEC_SUFFIX: &str = ".bspec";

/// The spec name of a file: its base name without [`SPEC_SUFFIX`].
pub fn spec_name(filename: &str) -> String {
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    base.strip_suffix(SPEC_SUFFIX).unwrap_or(base).to_string()
}

/// Build the IR for already-parsed declarations.
pub fn compile_declarations(name: &str, declarations: &[Declaration]) -> DeclResult<Specs> {
    build_specs(name, declarations)
}

/// Lex, parse and assemble one spec file.
///
/// Type aliases are scoped to the file: nothing declared by another spec is
/// visible here.
pub fn compile(source: &str, filename: &str) -> Result<Specs, CompileErrors> {
    let source_file = SourceFile::new(filename, source);
    let parsed = parse_source(&source_file);
    if parsed.errors.has_errors() {
        return Err(parsed.errors);
    }
    log::debug!(
        "{filename}: {} declaration(s) collected",
        parsed.declarations.len()
    );
    build_specs(&spec_name(filename), &parsed.declarations)
        .map_err(|e| CompileErrors::single(e.to_spec_error(&source_file)))
}

/// Diagnostics only, without backend selection.
pub fn check(source: &str, filename: &str) -> CompileErrors {
    match compile(source, filename) {
        Ok(_) => CompileErrors::empty(),
        Err(errors) => errors,
    }
}

/// Select a backend for `specs` and run it.
pub fn generate(
    name: &str,
    specs: &Specs,
    backends: &BackendRegistry,
    config: &dyn ProjectConfig,
) -> DeclResult<GeneratedCode> {
    let backend = backends.resolve(specs, config)?;
    log::debug!("{name}: generating with backend '{}'", backend.name());
    Ok(backend.generate(name, specs))
}

/// The outcome of compiling one spec file end to end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResult {
    pub success: bool,
    pub module: Option<String>,
    pub backend: Option<String>,
    pub header: Option<String>,
    pub source: Option<String>,
    pub ir_digest: Option<String>,
    pub errors: CompileErrors,
}

impl CompileResult {
    fn failed(errors: CompileErrors) -> Self {
        Self {
            success: false,
            module: None,
            backend: None,
            header: None,
            source: None,
            ir_digest: None,
            errors,
        }
    }
}

/// Compile and generate with the built-in backends.
///
/// Either both artifacts are present and `errors` is empty, or neither is.
pub fn compile_to_result(
    source: &str,
    filename: &str,
    config: &dyn ProjectConfig,
) -> CompileResult {
    let specs = match compile(source, filename) {
        Ok(specs) => specs,
        Err(errors) => return CompileResult::failed(errors),
    };
    let name = spec_name(filename);
    match generate(&name, &specs, &BackendRegistry::builtin(), config) {
        Ok(code) => CompileResult {
            success: true,
            module: Some(specs.module.clone()),
            backend: Some(code.backend),
            header: Some(code.header),
            source: Some(code.source),
            ir_digest: Some(specs.digest()),
            errors: CompileErrors::empty(),
        },
        Err(e) => {
            let source_file = SourceFile::new(filename, source);
            CompileResult::failed(CompileErrors::single(e.to_spec_error(&source_file)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_name() {
        assert_eq!(spec_name("example.bspec"), "example");
        assert_eq!(spec_name("c_src/example/example.bspec"), "example");
        assert_eq!(spec_name("plain"), "plain");
    }
}
