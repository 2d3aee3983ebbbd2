//! The capability every code generator implements.

use serde::{Deserialize, Serialize};

use crate::ir::Specs;

/// Turns a resolved [`Specs`] into native header and implementation text.
///
/// Implementations must be deterministic: the same IR always produces the
/// same bytes.
pub trait Backend: Send + Sync {
    /// Identity under which the backend is registered, e.g. `nif`.
    fn name(&self) -> &str;

    /// The header artifact, included by hand-written implementation code.
    fn generate_header(&self, name: &str, specs: &Specs) -> String;

    /// The implementation body artifact.
    fn generate_source(&self, name: &str, specs: &Specs) -> String;

    /// Both artifacts, tagged with this backend's identity.
    fn generate(&self, name: &str, specs: &Specs) -> GeneratedCode {
        GeneratedCode {
            backend: self.name().to_string(),
            header: self.generate_header(name, specs),
            source: self.generate_source(name, specs),
        }
    }
}

/// A backend-tagged header/source pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCode {
    pub backend: String,
    pub header: String,
    pub source: String,
}
