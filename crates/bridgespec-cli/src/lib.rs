//! bridgespec command line library.
//!
//! Discovers every `.bspec` file under a project root, compiles each one,
//! selects a backend from `bridgespec.toml` and writes the generated header
//! and source into `_generated/<backend>/` beside the spec.

pub mod config;
pub mod discover;
pub mod emit;
pub mod error;

use std::path::{Path, PathBuf};

use bridgespec_compiler::{compile, generate, BackendRegistry};
use bridgespec_types::ir::Specs;
use bridgespec_types::{CompileErrors, SourceFile};

pub use config::{ProjectFile, CONFIG_FILE};
pub use discover::{discover, SpecSource};
pub use emit::{format_artifacts, write_artifacts, Artifacts, GENERATED_DIR};
pub use error::{CliError, CliResult};

/// One spec file that produced artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub spec: PathBuf,
    pub module: String,
    pub backend: String,
    pub artifacts: Artifacts,
}

/// The outcome of a `generate` run over a project root.
#[derive(Debug, Default)]
pub struct GenerateReport {
    pub generated: Vec<Generated>,
    pub failures: Vec<CliError>,
}

impl GenerateReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Compile a single spec file.
pub fn compile_spec(spec: &SpecSource) -> CliResult<Specs> {
    compile(&spec.source, &spec.path.to_string_lossy()).map_err(|errors| CliError::Compile {
        path: spec.path.clone(),
        errors,
    })
}

fn generate_one(
    spec: &SpecSource,
    project: &ProjectFile,
    backends: &BackendRegistry,
) -> CliResult<Generated> {
    let specs = compile_spec(spec)?;
    let code = generate(&spec.name, &specs, backends, project).map_err(|e| {
        let source_file = SourceFile::new(spec.path.to_string_lossy(), spec.source.as_str());
        CliError::Compile {
            path: spec.path.clone(),
            errors: CompileErrors::single(e.to_spec_error(&source_file)),
        }
    })?;
    let artifacts = write_artifacts(&spec.dir, &spec.name, &code)?;
    if let Some(formatter) = &project.formatter {
        format_artifacts(formatter, &artifacts);
    }
    Ok(Generated {
        spec: spec.path.clone(),
        module: specs.module,
        backend: code.backend,
        artifacts,
    })
}

/// Generate artifacts for every spec under `root`.
///
/// Files are processed in path order and compiled independently; type
/// aliases never cross files. A failing file is recorded and the run
/// continues with the next one.
pub fn run_generate(root: &Path) -> CliResult<GenerateReport> {
    let project = ProjectFile::load(root)?;
    let backends = BackendRegistry::builtin();
    let sources = discover(root)?;

    let mut report = GenerateReport::default();
    for spec in &sources {
        match generate_one(spec, &project, &backends) {
            Ok(generated) => report.generated.push(generated),
            Err(e) => {
                log::error!("{}: generation failed", spec.path.display());
                report.failures.push(e);
            }
        }
    }
    log::info!(
        "{} spec(s) generated, {} failed",
        report.generated.len(),
        report.failures.len()
    );
    Ok(report)
}

/// Compile `path` and return its diagnostics as pretty JSON.
pub fn check_file(path: &Path) -> CliResult<(bool, String)> {
    let spec = SpecSource::read(path)?;
    let errors = bridgespec_compiler::check(&spec.source, &spec.path.to_string_lossy());
    let ok = !errors.has_errors();
    Ok((ok, serde_json::to_string_pretty(&errors)?))
}

/// Compile `path` and return its IR as pretty JSON.
pub fn ir_file(path: &Path) -> CliResult<String> {
    let spec = SpecSource::read(path)?;
    let specs = compile_spec(&spec)?;
    Ok(serde_json::to_string_pretty(&specs)?)
}
