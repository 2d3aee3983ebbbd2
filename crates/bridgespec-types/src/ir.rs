//! The resolved intermediate representation handed to backends.
//!
//! A [`Specs`] value is built once per spec file by the compiler and is
//! read-only afterwards. Every list keeps declaration order: struct field
//! order fixes native layout, enum variant order fixes integer encoding, and
//! clause order fixes the order of generated accessors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ══════════════════════════════════════════════════════════════════════════════
// Types
// ══════════════════════════════════════════════════════════════════════════════

/// A type reference as written in a spec.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    /// A primitive or a previously declared struct/enum alias.
    Named(String),
    /// `[T]`
    List(Box<TypeRef>),
    /// The literal-tag pseudo-type of result items.
    Label,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn list_of(inner: TypeRef) -> Self {
        TypeRef::List(Box::new(inner))
    }

    /// The innermost leaf name, looking through any number of list layers.
    pub fn leaf_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            TypeRef::List(inner) => inner.leaf_name(),
            TypeRef::Label => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, TypeRef::List(_))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
            TypeRef::Label => f.write_str("label"),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

/// A function argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arg {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

impl Arg {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// One element of a result clause: either a label or a typed output value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    /// Set exactly when `ty` is [`TypeRef::Label`].
    pub label: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

impl ResultItem {
    pub fn label(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self {
            label: Some(symbol.clone()),
            name: symbol,
            ty: TypeRef::Label,
        }
    }

    pub fn value(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            label: None,
            name: name.into(),
            ty,
        }
    }

    pub fn is_label(&self) -> bool {
        self.label.is_some()
    }
}

/// One alternative return shape of a function, with its derived accessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultClause {
    pub items: Vec<ResultItem>,
    /// `<function>_result_<label>_<label>...`, or `send_<labels>` for sends.
    pub accessor_name: String,
}

impl ResultClause {
    /// Label symbols in declaration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| item.label.as_deref())
    }

    /// Typed output values in declaration order.
    pub fn values(&self) -> impl Iterator<Item = &ResultItem> {
        self.items.iter().filter(|item| !item.is_label())
    }
}

/// The outbound message shape a native function may push asynchronously.
pub type SendSpec = ResultClause;

/// A native function signature.
///
/// Backends add one leading runtime-context argument that is not part of `args`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub arity: usize,
    pub args: Vec<Arg>,
    pub results: Vec<ResultClause>,
}

// ══════════════════════════════════════════════════════════════════════════════
// User-defined types
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

/// `type alias :: %Backing.Name{field: type, ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDef {
    pub alias: String,
    /// Dotted qualified name of the managed-side struct.
    pub backing_name: String,
    pub fields: Vec<StructField>,
}

/// `type alias :: :a | :b | ...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    pub alias: String,
    /// Never empty. Index is the integer encoding.
    pub variants: Vec<String>,
}

// ══════════════════════════════════════════════════════════════════════════════
// Scheduling & lifecycle
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirtyKind {
    Cpu,
    Io,
}

impl DirtyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DirtyKind::Cpu => "cpu",
            DirtyKind::Io => "io",
        }
    }
}

impl FromStr for DirtyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(DirtyKind::Cpu),
            "io" => Ok(DirtyKind::Io),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyEntry {
    pub function_name: String,
    pub arity: usize,
    pub kind: DirtyKind,
}

/// Lifecycle hooks a module may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hook {
    Load,
    Upgrade,
    Unload,
    Main,
}

impl Hook {
    pub fn as_str(self) -> &'static str {
        match self {
            Hook::Load => "load",
            Hook::Upgrade => "upgrade",
            Hook::Unload => "unload",
            Hook::Main => "main",
        }
    }

    /// Name used when a callback is declared without an explicit function.
    pub fn default_function_name(self) -> String {
        format!("handle_{}", self.as_str())
    }
}

impl FromStr for Hook {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "load" => Ok(Hook::Load),
            "upgrade" => Ok(Hook::Upgrade),
            "unload" => Ok(Hook::Unload),
            "main" => Ok(Hook::Main),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackEntry {
    pub hook: Hook,
    pub function_name: String,
}

// ══════════════════════════════════════════════════════════════════════════════
// Root
// ══════════════════════════════════════════════════════════════════════════════

/// The declared target interface(s) of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Interface {
    Single(String),
    Many(Vec<String>),
}

impl Interface {
    /// The tag that decides the backend. `None` for an empty list.
    pub fn first(&self) -> Option<&str> {
        match self {
            Interface::Single(tag) => Some(tag),
            Interface::Many(tags) => tags.first().map(String::as_str),
        }
    }
}

/// The fully resolved native surface of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specs {
    /// Dotted qualified module name.
    pub module: String,
    pub interface: Option<Interface>,
    pub state_type: Option<String>,
    pub functions: Vec<FunctionSpec>,
    pub structs: Vec<StructDef>,
    pub enums: Vec<EnumDef>,
    pub dirty: Vec<DirtyEntry>,
    pub callbacks: Vec<CallbackEntry>,
    pub sends: Option<SendSpec>,
}

impl Specs {
    pub fn function(&self, name: &str, arity: usize) -> Option<&FunctionSpec> {
        self.functions
            .iter()
            .find(|f| f.name == name && f.arity == arity)
    }

    pub fn struct_def(&self, alias: &str) -> Option<&StructDef> {
        self.structs.iter().find(|s| s.alias == alias)
    }

    pub fn enum_def(&self, alias: &str) -> Option<&EnumDef> {
        self.enums.iter().find(|e| e.alias == alias)
    }

    pub fn dirty_kind(&self, name: &str, arity: usize) -> Option<DirtyKind> {
        self.dirty
            .iter()
            .find(|d| d.function_name == name && d.arity == arity)
            .map(|d| d.kind)
    }

    pub fn callback(&self, hook: Hook) -> Option<&CallbackEntry> {
        self.callbacks.iter().find(|c| c.hook == hook)
    }

    /// Hex SHA-256 of the canonical JSON encoding.
    ///
    /// Identical IR always yields an identical digest; backends stamp it into
    /// generated files so stale artifacts are easy to spot.
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        Sha256::digest(&bytes)
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}
