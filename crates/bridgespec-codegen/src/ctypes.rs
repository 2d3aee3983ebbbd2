//! Mapping from IR types to C declarations and runtime helper names.

use bridgespec_types::ir::{FunctionSpec, ResultClause, Specs, TypeRef};

/// Primitive leaf types known to the runtimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Atom,
    Bool,
    Int,
    UInt,
    Int64,
    UInt64,
    Double,
    String,
    Pid,
    State,
    Payload,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "atom" => Primitive::Atom,
            "bool" => Primitive::Bool,
            "int" => Primitive::Int,
            "uint" | "unsigned" => Primitive::UInt,
            "int64" => Primitive::Int64,
            "uint64" => Primitive::UInt64,
            "double" | "float" => Primitive::Double,
            "string" => Primitive::String,
            "pid" => Primitive::Pid,
            "state" => Primitive::State,
            "payload" => Primitive::Payload,
            _ => return None,
        })
    }

    /// Suffix of the runtime's `bridge_<op>_<suffix>` helpers.
    pub fn suffix(self) -> &'static str {
        match self {
            Primitive::Atom => "atom",
            Primitive::Bool => "bool",
            Primitive::Int => "int",
            Primitive::UInt => "uint",
            Primitive::Int64 => "int64",
            Primitive::UInt64 => "uint64",
            Primitive::Double => "double",
            Primitive::String => "string",
            Primitive::Pid => "pid",
            Primitive::State => "state",
            Primitive::Payload => "payload",
        }
    }
}

/// What a leaf type name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf<'a> {
    Primitive(Primitive),
    Struct(&'a str),
    Enum(&'a str),
    /// Not declared in this spec. The compiler rejects such names, so only
    /// hand-built IR reaches this; it is emitted as an opaque C name.
    Unresolved(&'a str),
}

pub fn classify<'a>(specs: &Specs, name: &'a str) -> Leaf<'a> {
    if let Some(p) = Primitive::from_name(name) {
        Leaf::Primitive(p)
    } else if specs.struct_def(name).is_some() {
        Leaf::Struct(name)
    } else if specs.enum_def(name).is_some() {
        Leaf::Enum(name)
    } else {
        Leaf::Unresolved(name)
    }
}

/// Turn an arbitrary symbol into a valid C identifier.
pub fn c_ident(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// `MY_ENUM_OPTION_ONE`
pub fn enum_constant(alias: &str, variant: &str) -> String {
    format!("{}_{}", c_ident(alias), c_ident(variant)).to_uppercase()
}

/// C type of the state handle.
pub fn state_type(specs: &Specs) -> String {
    match &specs.state_type {
        Some(name) => format!("{} *", c_ident(name)),
        None => "void *".to_string(),
    }
}

/// C type of one value of `ty`. Nested lists collapse to the runtime's
/// generic `BridgeList`.
pub fn c_type(specs: &Specs, ty: &TypeRef) -> String {
    match ty {
        TypeRef::Named(name) => match classify(specs, name) {
            Leaf::Primitive(Primitive::Atom | Primitive::String) => "char *".to_string(),
            Leaf::Primitive(Primitive::Bool | Primitive::Int) => "int".to_string(),
            Leaf::Primitive(Primitive::UInt) => "unsigned int".to_string(),
            Leaf::Primitive(Primitive::Int64) => "int64_t".to_string(),
            Leaf::Primitive(Primitive::UInt64) => "uint64_t".to_string(),
            Leaf::Primitive(Primitive::Double) => "double".to_string(),
            Leaf::Primitive(Primitive::Pid) => "BridgePid".to_string(),
            Leaf::Primitive(Primitive::State) => state_type(specs),
            Leaf::Primitive(Primitive::Payload) => "BridgePayload".to_string(),
            Leaf::Struct(alias) | Leaf::Enum(alias) | Leaf::Unresolved(alias) => c_ident(alias),
        },
        TypeRef::List(_) => "BridgeList".to_string(),
        TypeRef::Label => "char *".to_string(),
    }
}

/// `char *` + `name` → `char *name`, `int` + `name` → `int name`.
pub fn declare(c_ty: &str, name: &str) -> String {
    if c_ty.ends_with('*') {
        format!("{c_ty}{name}")
    } else {
        format!("{c_ty} {name}")
    }
}

pub fn pointer_to(c_ty: &str) -> String {
    if c_ty.ends_with('*') {
        format!("{c_ty}*")
    } else {
        format!("{c_ty} *")
    }
}

/// Name of the length companion of a list value.
pub fn length_name(name: &str) -> String {
    format!("{name}_length")
}

/// Parameter (or field) declarations for one value.
///
/// Lists become an element pointer plus a length.
pub fn value_decls(specs: &Specs, name: &str, ty: &TypeRef) -> Vec<String> {
    let name = c_ident(name);
    match ty {
        TypeRef::List(inner) => vec![
            declare(&pointer_to(&c_type(specs, inner)), &name),
            declare("unsigned int", &length_name(&name)),
        ],
        _ => vec![declare(&c_type(specs, ty), &name)],
    }
}

/// Helper that converts one element of `ty`, e.g. `bridge_make_int` or
/// `make_my_struct` for `op == "make"`.
pub fn helper(specs: &Specs, op: &str, ty: &TypeRef) -> String {
    match ty {
        TypeRef::Named(name) => match classify(specs, name) {
            Leaf::Primitive(p) => format!("bridge_{op}_{}", p.suffix()),
            Leaf::Struct(alias) | Leaf::Enum(alias) | Leaf::Unresolved(alias) => {
                format!("{op}_{}", c_ident(alias))
            }
        },
        TypeRef::List(_) => format!("bridge_{op}_list_value"),
        TypeRef::Label => format!("bridge_{op}_atom"),
    }
}

/// C name of the hand-written implementation of `function`.
///
/// Names shared by several arities get an arity suffix.
pub fn impl_name(specs: &Specs, function: &FunctionSpec) -> String {
    if is_overloaded(specs, function) {
        format!("{}_{}", c_ident(&function.name), function.arity)
    } else {
        c_ident(&function.name)
    }
}

fn is_overloaded(specs: &Specs, function: &FunctionSpec) -> bool {
    specs
        .functions
        .iter()
        .filter(|f| f.name == function.name)
        .count()
        > 1
}

/// C name of the accessor building `clause` of `function`.
///
/// Follows [`impl_name`]: `f_1_result_ok` when `f` has several arities.
pub fn accessor_c_name(specs: &Specs, function: &FunctionSpec, clause: &ResultClause) -> String {
    if !is_overloaded(specs, function) {
        return c_ident(&clause.accessor_name);
    }
    let labels = clause
        .accessor_name
        .strip_prefix(function.name.as_str())
        .unwrap_or(&clause.accessor_name);
    c_ident(&format!("{}{labels}", impl_name(specs, function)))
}

/// Uppercased include guard for a generated header.
pub fn include_guard(name: &str, backend: &str) -> String {
    format!("BRIDGESPEC_{}_{}_H", c_ident(name), c_ident(backend)).to_uppercase()
}

/// A C string literal.
pub fn c_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
