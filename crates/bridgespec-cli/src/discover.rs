//! Recursive discovery of `<name>.bspec` files.

use std::path::{Path, PathBuf};

use bridgespec_compiler::{spec_name, SPEC_SUFFIX};
use walkdir::{DirEntry, WalkDir};

use crate::emit::GENERATED_DIR;
use crate::error::{CliError, CliResult};

/// One spec file found under the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSource {
    /// Base name without the suffix; names the generated files.
    pub name: String,
    /// Directory holding the spec; output goes below it.
    pub dir: PathBuf,
    pub path: PathBuf,
    pub source: String,
}

impl SpecSource {
    pub fn read(path: &Path) -> CliResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        Ok(Self {
            name: spec_name(file_name),
            dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            path: path.to_path_buf(),
            source,
        })
    }
}

fn should_walk(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    !(name.starts_with('.') || name == GENERATED_DIR || name == "target")
}

fn is_spec_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.len() > SPEC_SUFFIX.len() && n.ends_with(SPEC_SUFFIX))
}

/// Every spec file under `root`, sorted by path.
pub fn discover(root: &Path) -> CliResult<Vec<SpecSource>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(should_walk)
    {
        let entry = entry?;
        if entry.file_type().is_file() && is_spec_file(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    log::debug!("found {} spec file(s) under {}", paths.len(), root.display());
    paths.iter().map(|p| SpecSource::read(p)).collect()
}
