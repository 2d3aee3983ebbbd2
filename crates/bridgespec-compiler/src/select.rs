//! Backend selection.
//!
//! The first declared interface tag picks the backend. Specs without an
//! `interface` declaration fall back to the project configuration.

use std::collections::{BTreeMap, HashMap};

use bridgespec_types::ir::Specs;
use bridgespec_types::Backend;

use crate::error::{DeclError, DeclResult};

/// The project configuration sections consulted for a module, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigCategory {
    Natives,
    Libs,
}

impl ConfigCategory {
    pub const PRIORITY: [ConfigCategory; 2] = [ConfigCategory::Natives, ConfigCategory::Libs];
}

/// Read-only lookup of interface tags configured for a module.
pub trait ProjectConfig {
    /// Interface tags configured for `module` under `category`, possibly empty.
    fn interfaces(&self, category: ConfigCategory, module: &str) -> Vec<String>;
}

/// A configuration that declares nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProjectConfig;

impl ProjectConfig for NoProjectConfig {
    fn interfaces(&self, _category: ConfigCategory, _module: &str) -> Vec<String> {
        Vec::new()
    }
}

/// In-memory configuration keyed by category and module name.
#[derive(Debug, Clone, Default)]
pub struct StaticProjectConfig {
    entries: HashMap<(ConfigCategory, String), Vec<String>>,
}

impl StaticProjectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I, S>(
        mut self,
        category: ConfigCategory,
        module: impl Into<String>,
        interfaces: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.insert(
            (category, module.into()),
            interfaces.into_iter().map(Into::into).collect(),
        );
        self
    }
}

impl ProjectConfig for StaticProjectConfig {
    fn interfaces(&self, category: ConfigCategory, module: &str) -> Vec<String> {
        self.entries
            .get(&(category, module.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

/// Map an interface tag onto a backend identity.
///
/// The two built-in spellings are folded; any other tag passes through so
/// extra backends can register under their own name.
pub fn canonical_backend(tag: &str) -> String {
    let tag = tag.strip_prefix(':').unwrap_or(tag);
    match tag {
        "NIF" | "nif" => "nif".to_string(),
        "CNode" | "cnode" => "cnode".to_string(),
        other => other.to_string(),
    }
}

/// Decide which backend identity handles `specs`.
pub fn select_backend_name(specs: &Specs, config: &dyn ProjectConfig) -> DeclResult<String> {
    if let Some(tag) = specs.interface.as_ref().and_then(|i| i.first()) {
        return Ok(canonical_backend(tag));
    }
    for category in ConfigCategory::PRIORITY {
        let tags = config.interfaces(category, &specs.module);
        if let Some(tag) = tags.first() {
            log::debug!(
                "{}: interface '{tag}' taken from {category:?} configuration",
                specs.module
            );
            return Ok(canonical_backend(tag));
        }
    }
    Err(DeclError::InterfaceNotSpecified {
        module: specs.module.clone(),
    })
}

/// Backends available to the selector, keyed by identity.
#[derive(Default)]
pub struct BackendRegistry {
    backends: BTreeMap<String, Box<dyn Backend>>,
}

impl BackendRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The `nif` and `cnode` backends.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for backend in bridgespec_codegen::builtin_backends() {
            registry.register(backend);
        }
        registry
    }

    /// Add a backend, replacing any previous one with the same name.
    pub fn register(&mut self, backend: Box<dyn Backend>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Backend> {
        self.backends.get(name).map(|b| b.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }

    /// Select and look up the backend for `specs`.
    pub fn resolve(&self, specs: &Specs, config: &dyn ProjectConfig) -> DeclResult<&dyn Backend> {
        let tag = select_backend_name(specs, config)?;
        self.get(&tag).ok_or(DeclError::UnknownBackend { tag })
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.backends.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridgespec_types::ir::Interface;

    fn specs(interface: Option<Interface>) -> Specs {
        Specs {
            module: "Example".into(),
            interface,
            state_type: None,
            functions: Vec::new(),
            structs: Vec::new(),
            enums: Vec::new(),
            dirty: Vec::new(),
            callbacks: Vec::new(),
            sends: None,
        }
    }

    #[test]
    fn test_canonical_names() {
        assert_eq!(canonical_backend("NIF"), "nif");
        assert_eq!(canonical_backend(":nif"), "nif");
        assert_eq!(canonical_backend("CNode"), "cnode");
        assert_eq!(canonical_backend("Port"), "Port");
    }

    #[test]
    fn test_first_declared_tag_wins() {
        let s = specs(Some(Interface::Many(vec!["CNode".into(), "NIF".into()])));
        assert_eq!(select_backend_name(&s, &NoProjectConfig).unwrap(), "cnode");
    }

    #[test]
    fn test_declared_tag_beats_configuration() {
        let config = StaticProjectConfig::new().with(ConfigCategory::Natives, "Example", ["cnode"]);
        let s = specs(Some(Interface::Single("NIF".into())));
        assert_eq!(select_backend_name(&s, &config).unwrap(), "nif");
    }

    #[test]
    fn test_natives_checked_before_libs() {
        let config = StaticProjectConfig::new()
            .with(ConfigCategory::Libs, "Example", ["cnode"])
            .with(ConfigCategory::Natives, "Example", ["nif"]);
        assert_eq!(select_backend_name(&specs(None), &config).unwrap(), "nif");

        let libs_only = StaticProjectConfig::new()
            .with(ConfigCategory::Natives, "Example", Vec::<String>::new())
            .with(ConfigCategory::Libs, "Example", ["cnode"]);
        assert_eq!(select_backend_name(&specs(None), &libs_only).unwrap(), "cnode");
    }

    #[test]
    fn test_nothing_configured() {
        let err = select_backend_name(&specs(None), &NoProjectConfig).unwrap_err();
        assert_eq!(
            err,
            DeclError::InterfaceNotSpecified {
                module: "Example".into()
            }
        );
    }

    #[test]
    fn test_unknown_backend() {
        let registry = BackendRegistry::builtin();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["cnode", "nif"]);
        let s = specs(Some(Interface::Single("Port".into())));
        let err = registry.resolve(&s, &NoProjectConfig).err().unwrap();
        assert_eq!(err, DeclError::UnknownBackend { tag: "Port".into() });
    }
}
