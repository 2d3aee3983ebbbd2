//! Project configuration read from `bridgespec.toml`.
//!
//! ```toml
//! formatter = "clang-format"
//!
//! [natives.Example]
//! interfaces = ["nif"]
//!
//! [libs.Example]
//! interfaces = ["cnode"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use bridgespec_compiler::{ConfigCategory, ProjectConfig};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// File name looked up at the project root.
pub const CONFIG_FILE: &str = "bridgespec.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Command run over generated files, e.g. `clang-format`.
    #[serde(default)]
    pub formatter: Option<String>,

    /// Native function modules, keyed by module name.
    #[serde(default)]
    pub natives: BTreeMap<String, ModuleEntry>,

    /// Shared library modules, keyed by module name.
    #[serde(default)]
    pub libs: BTreeMap<String, ModuleEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleEntry {
    #[serde(default)]
    pub interfaces: Vec<String>,
}

impl ProjectFile {
    pub fn parse(text: &str, path: &Path) -> CliResult<Self> {
        toml::from_str(text).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `bridgespec.toml` from `root`; a missing file is an empty config.
    pub fn load(root: &Path) -> CliResult<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            log::debug!("no {} under {}", CONFIG_FILE, root.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|e| CliError::io(&path, e))?;
        let config = Self::parse(&text, &path)?;
        log::debug!(
            "loaded {}: {} native and {} lib module(s)",
            path.display(),
            config.natives.len(),
            config.libs.len()
        );
        Ok(config)
    }
}

impl ProjectConfig for ProjectFile {
    fn interfaces(&self, category: ConfigCategory, module: &str) -> Vec<String> {
        let section = match category {
            ConfigCategory::Natives => &self.natives,
            ConfigCategory::Libs => &self.libs,
        };
        section
            .get(module)
            .map(|entry| entry.interfaces.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections() {
        let config = ProjectFile::parse(
            r#"
formatter = "clang-format"

[natives.Example]
interfaces = ["nif"]

[libs."My.Lib"]
interfaces = ["cnode", "nif"]
"#,
            Path::new(CONFIG_FILE),
        )
        .unwrap();
        assert_eq!(config.formatter.as_deref(), Some("clang-format"));
        assert_eq!(
            config.interfaces(ConfigCategory::Natives, "Example"),
            vec!["nif"]
        );
        assert_eq!(
            config.interfaces(ConfigCategory::Libs, "My.Lib"),
            vec!["cnode", "nif"]
        );
        assert!(config.interfaces(ConfigCategory::Libs, "Example").is_empty());
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = ProjectFile::parse("", Path::new(CONFIG_FILE)).unwrap();
        assert_eq!(config, ProjectFile::default());
    }

    #[test]
    fn test_invalid_toml() {
        let err = ProjectFile::parse("natives = 3", Path::new(CONFIG_FILE)).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }
}
