//! Grammar normalizer: one raw declaration in, one canonical record out.
//!
//! All checks here are local to the declaration. Cross-declaration rules
//! (type ordering, uniqueness) are applied later by the registry.

use bridgespec_types::ast::{Declaration, Expr, ExprKind, Ident};
use bridgespec_types::ir::{
    Arg, CallbackEntry, DirtyEntry, DirtyKind, EnumDef, Hook, Interface, ResultItem, StructDef,
    StructField, TypeRef,
};
use bridgespec_types::Span;

use crate::error::{DeclError, DeclResult};

/// Name of the pseudo-type marking a label item.
pub const LABEL_TYPE: &str = "label";

// ══════════════════════════════════════════════════════════════════════════════
// Records
// ══════════════════════════════════════════════════════════════════════════════

/// The canonical form of one declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Module(String),
    /// `None` when the declaration lists no tags at all.
    Interface(Option<Interface>),
    StateType(String),
    Function(RawFunction),
    Struct(StructDef),
    Enum(EnumDef),
    Dirty(Vec<DirtyEntry>),
    Callback(CallbackEntry),
    Sends(RawClause),
}

/// A function before its result clauses are indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFunction {
    pub name: String,
    pub args: Vec<Arg>,
    pub results: Vec<RawClause>,
    pub span: Span,
}

/// A result clause before its accessor name is derived.
#[derive(Debug, Clone, PartialEq)]
pub struct RawClause {
    pub items: Vec<ResultItem>,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Entry point
// ══════════════════════════════════════════════════════════════════════════════

/// Normalize one declaration according to its kind.
pub fn normalize(decl: &Declaration) -> DeclResult<Record> {
    let cx = Cx { decl };
    match decl.kind.name.as_str() {
        "module" => cx.module(),
        "interface" => cx.interface(),
        "state_type" => cx.state_type(),
        "spec" => cx.function().map(Record::Function),
        "type" => cx.type_def(),
        "dirty" => cx.dirty(),
        "callback" => cx.callback(),
        "sends" => {
            let [payload] = cx.payload::<1>()?;
            cx.clause(payload).map(Record::Sends)
        }
        _ => Err(DeclError::MalformedDeclaration {
            kind: decl.kind.name.clone(),
            fragment: decl.kind.name.clone(),
            reason: "unknown declaration kind".to_string(),
            span: decl.kind.span,
        }),
    }
}

/// Per-declaration context, so every error names the declaration kind.
struct Cx<'a> {
    decl: &'a Declaration,
}

impl Cx<'_> {
    fn malformed(&self, expr: &Expr, reason: impl Into<String>) -> DeclError {
        DeclError::MalformedDeclaration {
            kind: self.decl.kind.name.clone(),
            fragment: expr.to_string(),
            reason: reason.into(),
            span: expr.span,
        }
    }

    /// Exactly `N` payload expressions.
    fn payload<const N: usize>(&self) -> DeclResult<[&Expr; N]> {
        let refs: Vec<&Expr> = self.decl.payload.iter().collect();
        refs.try_into().map_err(|_| DeclError::MalformedDeclaration {
            kind: self.decl.kind.name.clone(),
            fragment: self.rendered_payload(),
            reason: format!(
                "expected {N} argument{}, got {}",
                if N == 1 { "" } else { "s" },
                self.decl.payload.len()
            ),
            span: self.decl.span,
        })
    }

    fn rendered_payload(&self) -> String {
        let parts: Vec<String> = self.decl.payload.iter().map(|e| e.to_string()).collect();
        format!("{} {}", self.decl.kind.name, parts.join(", "))
            .trim_end()
            .to_string()
    }

    // ── module / interface / state_type ──────────────────────────────────────

    fn module(&self) -> DeclResult<Record> {
        let [name] = self.payload::<1>()?;
        match &name.kind {
            ExprKind::Alias(parts) => Ok(Record::Module(parts.join("."))),
            _ => Err(self.malformed(name, "expected a module name such as `My.Module`")),
        }
    }

    fn interface(&self) -> DeclResult<Record> {
        let [tags] = self.payload::<1>()?;
        match &tags.kind {
            ExprKind::List(items) if items.is_empty() => Ok(Record::Interface(None)),
            ExprKind::List(items) => {
                let tags = items
                    .iter()
                    .map(|item| self.interface_tag(item))
                    .collect::<DeclResult<Vec<_>>>()?;
                Ok(Record::Interface(Some(Interface::Many(tags))))
            }
            _ => Ok(Record::Interface(Some(Interface::Single(
                self.interface_tag(tags)?,
            )))),
        }
    }

    fn interface_tag(&self, expr: &Expr) -> DeclResult<String> {
        match &expr.kind {
            ExprKind::Alias(parts) => Ok(parts.join(".")),
            ExprKind::Atom(name) => Ok(name.clone()),
            _ => Err(self.malformed(expr, "expected an interface tag such as `NIF` or `:cnode`")),
        }
    }

    fn state_type(&self) -> DeclResult<Record> {
        let [name] = self.payload::<1>()?;
        match &name.kind {
            ExprKind::Str(s) if !s.is_empty() => Ok(Record::StateType(s.clone())),
            ExprKind::Ident(s) => Ok(Record::StateType(s.clone())),
            ExprKind::Alias(parts) => Ok(Record::StateType(parts.join("."))),
            _ => Err(self.malformed(name, "expected a state type name")),
        }
    }

    // ── spec ─────────────────────────────────────────────────────────────────

    fn function(&self) -> DeclResult<RawFunction> {
        let [sig] = self.payload::<1>()?;
        let ExprKind::Typed(head, result) = &sig.kind else {
            return Err(self.malformed(sig, "expected `name(args) :: results`"));
        };
        let (name, raw_args): (&str, &[Expr]) = match &head.kind {
            ExprKind::Call { name, args } => (&name.name, args),
            ExprKind::Ident(name) => (name, &[]),
            _ => return Err(self.malformed(head, "expected a function head")),
        };
        let args = raw_args
            .iter()
            .map(|a| self.arg(a))
            .collect::<DeclResult<Vec<_>>>()?;
        let results = flatten_alternatives(result)
            .into_iter()
            .map(|clause| self.clause(clause))
            .collect::<DeclResult<Vec<_>>>()?;
        Ok(RawFunction {
            name: name.to_string(),
            args,
            results,
            span: sig.span,
        })
    }

    /// `name`, `[name]` or `name :: type`.
    fn arg(&self, expr: &Expr) -> DeclResult<Arg> {
        match &expr.kind {
            ExprKind::Ident(name) => Ok(Arg::new(name, self.value_type(name, expr)?)),
            ExprKind::List(items) => match items.as_slice() {
                [inner] => match &inner.kind {
                    ExprKind::Ident(name) => Ok(Arg::new(
                        name,
                        TypeRef::list_of(self.value_type(name, inner)?),
                    )),
                    _ => Err(self.malformed(expr, "expected `[name]`")),
                },
                _ => Err(self.malformed(expr, "a list argument holds exactly one name")),
            },
            ExprKind::Typed(name, ty) => match &name.kind {
                ExprKind::Ident(name) => Ok(Arg::new(name, self.type_ref(ty)?)),
                _ => Err(self.malformed(name, "expected an argument name")),
            },
            _ => Err(self.malformed(expr, "expected an argument")),
        }
    }

    /// A leaf type name used where values are expected; `label` is rejected.
    fn value_type(&self, name: &str, expr: &Expr) -> DeclResult<TypeRef> {
        if name == LABEL_TYPE {
            return Err(self.malformed(expr, "'label' is only allowed in result clauses"));
        }
        Ok(TypeRef::named(name))
    }

    /// `int`, `[int]`, `[[int]]`, ...
    fn type_ref(&self, expr: &Expr) -> DeclResult<TypeRef> {
        match &expr.kind {
            ExprKind::Ident(name) => self.value_type(name, expr),
            ExprKind::List(items) => match items.as_slice() {
                [inner] => Ok(TypeRef::list_of(self.type_ref(inner)?)),
                _ => Err(self.malformed(expr, "a list type holds exactly one element type")),
            },
            _ => Err(self.malformed(expr, "expected a type")),
        }
    }

    /// A grouping yields one item per child; any other node is a one-item clause.
    fn clause(&self, expr: &Expr) -> DeclResult<RawClause> {
        let items = match &expr.kind {
            ExprKind::Tuple(children) => children
                .iter()
                .map(|child| self.result_item(child))
                .collect::<DeclResult<Vec<_>>>()?,
            _ => vec![self.result_item(expr)?],
        };
        Ok(RawClause {
            items,
            span: expr.span,
        })
    }

    fn result_item(&self, expr: &Expr) -> DeclResult<ResultItem> {
        match &expr.kind {
            ExprKind::Atom(symbol) => Ok(ResultItem::label(symbol)),
            ExprKind::Typed(name, ty) if ty.as_ident() == Some(LABEL_TYPE) => {
                match &name.kind {
                    ExprKind::Atom(symbol) | ExprKind::Ident(symbol) => {
                        Ok(ResultItem::label(symbol))
                    }
                    _ => Err(self.malformed(name, "expected a label symbol")),
                }
            }
            ExprKind::Typed(name, _) if name.as_atom().is_some() => {
                Err(self.malformed(expr, "a symbol can only be typed as `label`"))
            }
            _ => {
                let arg = self.arg(expr)?;
                Ok(ResultItem::value(arg.name, arg.ty))
            }
        }
    }

    // ── type ─────────────────────────────────────────────────────────────────

    fn type_def(&self) -> DeclResult<Record> {
        let [def] = self.payload::<1>()?;
        let ExprKind::Typed(alias, body) = &def.kind else {
            return Err(self.malformed(def, "expected `alias :: definition`"));
        };
        let Some(alias) = alias.as_ident() else {
            return Err(self.malformed(alias, "expected a lower-case type alias"));
        };

        match &body.kind {
            ExprKind::Map { alias: backing, entries } => {
                let fields = self.struct_fields(entries)?;
                Ok(Record::Struct(StructDef {
                    alias: alias.to_string(),
                    backing_name: backing.join("."),
                    fields,
                }))
            }
            ExprKind::Atom(_) | ExprKind::Alt(_, _) => {
                let variants = flatten_alternatives(body)
                    .into_iter()
                    .map(|v| match &v.kind {
                        ExprKind::Atom(symbol) => Ok(symbol.clone()),
                        _ => Err(self.malformed(v, "enum variants must be symbols")),
                    })
                    .collect::<DeclResult<Vec<_>>>()?;
                Ok(Record::Enum(EnumDef {
                    alias: alias.to_string(),
                    variants,
                }))
            }
            _ => Err(self.malformed(body, "expected `%Struct{...}` or `:a | :b`")),
        }
    }

    fn struct_fields(&self, entries: &[(Ident, Expr)]) -> DeclResult<Vec<StructField>> {
        let mut fields: Vec<StructField> = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            if fields.iter().any(|f| f.name == key.name) {
                return Err(self.malformed(value, format!("field '{}' appears twice", key.name)));
            }
            let ty = match &value.kind {
                ExprKind::Ident(name) => self.value_type(name, value)?,
                ExprKind::List(items) => match items.as_slice() {
                    [inner] => match &inner.kind {
                        ExprKind::Ident(name) => TypeRef::list_of(self.value_type(name, inner)?),
                        _ => return Err(self.malformed(value, "expected `[type]`")),
                    },
                    _ => return Err(self.malformed(value, "expected `[type]`")),
                },
                _ => return Err(self.malformed(value, "expected a field type")),
            };
            fields.push(StructField {
                name: key.name.clone(),
                ty,
            });
        }
        Ok(fields)
    }

    // ── dirty / callback ─────────────────────────────────────────────────────

    fn dirty(&self) -> DeclResult<Record> {
        let Some((kind_expr, functions)) = self.decl.payload.split_first() else {
            return Err(DeclError::MalformedDeclaration {
                kind: "dirty".to_string(),
                fragment: self.rendered_payload(),
                reason: "expected `dirty :cpu, fun: arity, ...`".to_string(),
                span: self.decl.span,
            });
        };
        let kind_name =
            symbol_name(kind_expr).ok_or_else(|| self.malformed(kind_expr, "expected :cpu or :io"))?;
        let kind = kind_name
            .parse::<DirtyKind>()
            .map_err(|kind_name| DeclError::InvalidDirtyKind {
                kind: kind_name,
                span: kind_expr.span,
            })?;

        let mut entries = Vec::new();
        for expr in functions {
            self.dirty_functions(expr, kind, &mut entries)?;
        }
        if entries.is_empty() {
            return Err(DeclError::MalformedDeclaration {
                kind: "dirty".to_string(),
                fragment: self.rendered_payload(),
                reason: "no functions listed".to_string(),
                span: self.decl.span,
            });
        }
        Ok(Record::Dirty(entries))
    }

    /// Accepts `fun: 1, ...`, `[fun: 1, ...]` and `{fun, 1}` forms.
    fn dirty_functions(
        &self,
        expr: &Expr,
        kind: DirtyKind,
        out: &mut Vec<DirtyEntry>,
    ) -> DeclResult<()> {
        match &expr.kind {
            ExprKind::Keyword(pairs) => {
                for (name, arity) in pairs {
                    out.push(DirtyEntry {
                        function_name: name.name.clone(),
                        arity: self.arity(arity)?,
                        kind,
                    });
                }
                Ok(())
            }
            ExprKind::List(items) => {
                for item in items {
                    self.dirty_functions(item, kind, out)?;
                }
                Ok(())
            }
            ExprKind::Tuple(items) => match items.as_slice() {
                [name, arity] => {
                    let function_name = symbol_name(name)
                        .ok_or_else(|| self.malformed(name, "expected a function name"))?;
                    out.push(DirtyEntry {
                        function_name,
                        arity: self.arity(arity)?,
                        kind,
                    });
                    Ok(())
                }
                _ => Err(self.malformed(expr, "expected `{fun, arity}`")),
            },
            _ => Err(self.malformed(expr, "expected `fun: arity`")),
        }
    }

    fn arity(&self, expr: &Expr) -> DeclResult<usize> {
        match expr.kind {
            ExprKind::Int(n) if n >= 0 => Ok(n as usize),
            _ => Err(self.malformed(expr, "expected a non-negative arity")),
        }
    }

    fn callback(&self) -> DeclResult<Record> {
        let (hook_expr, function) = match self.decl.payload.as_slice() {
            [hook] => (hook, None),
            [hook, function] => (hook, Some(function)),
            _ => {
                return Err(DeclError::MalformedDeclaration {
                    kind: "callback".to_string(),
                    fragment: self.rendered_payload(),
                    reason: "expected `callback :hook` or `callback :hook, :function`".to_string(),
                    span: self.decl.span,
                })
            }
        };
        let hook_name =
            symbol_name(hook_expr).ok_or_else(|| self.malformed(hook_expr, "expected a hook symbol"))?;
        let hook = hook_name
            .parse::<Hook>()
            .map_err(|hook| DeclError::InvalidHook {
                hook,
                span: hook_expr.span,
            })?;
        let function_name = match function {
            Some(f) => symbol_name(f).ok_or_else(|| self.malformed(f, "expected a function name"))?,
            None => hook.default_function_name(),
        };
        Ok(Record::Callback(CallbackEntry {
            hook,
            function_name,
        }))
    }
}

/// `:name` or `name`.
fn symbol_name(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Atom(name) | ExprKind::Ident(name) => Some(name.clone()),
        _ => None,
    }
}

/// Flatten a tree of `|` nodes left to right.
fn flatten_alternatives(expr: &Expr) -> Vec<&Expr> {
    match &expr.kind {
        ExprKind::Alt(lhs, rhs) => {
            let mut out = flatten_alternatives(lhs);
            out.extend(flatten_alternatives(rhs));
            out
        }
        _ => vec![expr],
    }
}
