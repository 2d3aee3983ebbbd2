//! Raw declaration trees produced by the parser.
//!
//! A spec file is a flat, ordered list of [`Declaration`]s. Each one is a
//! kind tag plus untyped payload expressions; no kind-specific meaning is
//! attached until the compiler normalizes them. Every node carries a
//! [`Span`] so later stages can point back at the offending fragment.

use std::fmt;

use crate::Span;

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// One raw declaration: `kind payload, payload, ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// `module`, `spec`, `type`, `dirty`, ...
    pub kind: Ident,
    pub payload: Vec<Expr>,
    pub span: Span,
}

/// An expression node with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The identifier name, if this node is a bare identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// The symbol, if this node is an atom (`:ok`).
    pub fn as_atom(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Atom(name) => Some(name),
            _ => None,
        }
    }
}

/// Generic expression shapes. The grammar is deliberately small: every
/// declaration kind is expressed with these building blocks.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `count`
    Ident(String),
    /// `My.Struct`, one segment per dotted part.
    Alias(Vec<String>),
    /// `:ok`
    Atom(String),
    /// `3`
    Int(i64),
    /// `"MyState"`
    Str(String),
    /// `[a, b]`
    List(Vec<Expr>),
    /// `{a, b}`: the grouping node of result clauses.
    Tuple(Vec<Expr>),
    /// `name(args...)`
    Call { name: Ident, args: Vec<Expr> },
    /// `lhs :: rhs`
    Typed(Box<Expr>, Box<Expr>),
    /// `lhs | rhs`
    Alt(Box<Expr>, Box<Expr>),
    /// `%My.Struct{key: value, ...}`
    Map {
        alias: Vec<String>,
        entries: Vec<(Ident, Expr)>,
    },
    /// `key: value, ...` as a trailing argument or inside a list.
    Keyword(Vec<(Ident, Expr)>),
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_pairs(f: &mut fmt::Formatter<'_>, pairs: &[(Ident, Expr)]) -> fmt::Result {
    for (i, (key, value)) in pairs.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}: {value}", key.name)?;
    }
    Ok(())
}

/// Renders the node back in surface syntax, used to quote fragments in errors.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Ident(name) => f.write_str(name),
            ExprKind::Alias(parts) => f.write_str(&parts.join(".")),
            ExprKind::Atom(name) => write!(f, ":{name}"),
            ExprKind::Int(value) => write!(f, "{value}"),
            ExprKind::Str(value) => write!(f, "{value:?}"),
            ExprKind::List(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            ExprKind::Tuple(items) => {
                f.write_str("{")?;
                write_joined(f, items)?;
                f.write_str("}")
            }
            ExprKind::Call { name, args } => {
                write!(f, "{}(", name.name)?;
                write_joined(f, args)?;
                f.write_str(")")
            }
            ExprKind::Typed(lhs, rhs) => write!(f, "{lhs} :: {rhs}"),
            ExprKind::Alt(lhs, rhs) => write!(f, "{lhs} | {rhs}"),
            ExprKind::Map { alias, entries } => {
                write!(f, "%{}{{", alias.join("."))?;
                write_pairs(f, entries)?;
                f.write_str("}")
            }
            ExprKind::Keyword(pairs) => write_pairs(f, pairs),
        }
    }
}
