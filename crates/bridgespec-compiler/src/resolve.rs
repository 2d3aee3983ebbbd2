//! Type resolver.
//!
//! Resolution is single-pass and order-sensitive: a struct or enum alias is
//! visible only to declarations that come after it in the same file. Aliases
//! never cross file boundaries.

use std::collections::HashSet;

use bridgespec_types::ir::{StructDef, TypeRef};
use bridgespec_types::Span;

use crate::error::{DeclError, DeclResult};
use crate::normalize::RawFunction;

/// Leaf type names that are never checked here; backends decide their legality.
pub const PRIMITIVES: &[&str] = &[
    "atom", "bool", "int", "uint", "int64", "uint64", "unsigned", "double", "float", "string",
    "pid", "state", "payload",
];

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

/// The set of type aliases visible at the current point of a file.
#[derive(Debug, Default, Clone)]
pub struct TypeScope {
    declared: HashSet<String>,
}

impl TypeScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `alias` visible to everything declared after this point.
    pub fn declare(&mut self, alias: &str) {
        self.declared.insert(alias.to_string());
    }

    pub fn is_declared(&self, alias: &str) -> bool {
        self.declared.contains(alias)
    }

    /// Check every field of a struct that is about to be declared.
    ///
    /// A field may point at its own struct only through a list.
    pub fn resolve_struct(&self, def: &StructDef, span: Span) -> DeclResult<()> {
        for field in &def.fields {
            let Some(leaf) = field.ty.leaf_name() else {
                continue;
            };
            if is_primitive(leaf) || self.declared.contains(leaf) {
                continue;
            }
            if leaf == def.alias && field.ty.is_list() {
                continue;
            }
            return Err(DeclError::UnknownType {
                name: leaf.to_string(),
                used_in: format!("{}.{}", def.alias, field.name),
                span,
            });
        }
        Ok(())
    }

    /// Check the argument and result value types of a function.
    pub fn resolve_function(&self, function: &RawFunction) -> DeclResult<()> {
        let arg_types = function.args.iter().map(|a| &a.ty);
        let result_types = function
            .results
            .iter()
            .flat_map(|clause| clause.items.iter())
            .filter(|item| !item.is_label())
            .map(|item| &item.ty);
        for ty in arg_types.chain(result_types) {
            self.resolve_signature_type(ty, &function.name, function.span)?;
        }
        Ok(())
    }

    /// Check the value types of a clause that is not attached to a function.
    pub fn resolve_clause_types<'a>(
        &self,
        types: impl IntoIterator<Item = &'a TypeRef>,
        used_in: &str,
        span: Span,
    ) -> DeclResult<()> {
        for ty in types {
            self.resolve_signature_type(ty, used_in, span)?;
        }
        Ok(())
    }

    fn resolve_signature_type(&self, ty: &TypeRef, used_in: &str, span: Span) -> DeclResult<()> {
        let Some(leaf) = ty.leaf_name() else {
            return Ok(());
        };
        if is_primitive(leaf) || self.declared.contains(leaf) {
            return Ok(());
        }
        Err(DeclError::UnknownType {
            name: leaf.to_string(),
            used_in: used_in.to_string(),
            span,
        })
    }
}
