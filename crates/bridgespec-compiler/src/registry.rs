//! Specs registry: folds normalized records into one [`Specs`] value.
//!
//! Declarations are applied strictly in source order and the first violation
//! aborts the file. Single-valued settings (module, interface, state type,
//! sends, callback per hook, dirty entry per function) are last-write-wins.

use bridgespec_types::ast::Declaration;
use bridgespec_types::ir::{
    CallbackEntry, DirtyEntry, EnumDef, FunctionSpec, Interface, SendSpec, Specs, StructDef,
};
use bridgespec_types::Span;

use crate::error::{DeclError, DeclResult};
use crate::normalize::{normalize, RawClause, RawFunction, Record};
use crate::resolve::TypeScope;
use crate::results::{index_results, index_send, SENDS};

/// Accumulates one spec file's declarations.
#[derive(Debug)]
pub struct SpecsBuilder {
    name: String,
    module: Option<String>,
    interface: Option<Interface>,
    state_type: Option<String>,
    functions: Vec<FunctionSpec>,
    structs: Vec<StructDef>,
    enums: Vec<EnumDef>,
    dirty: Vec<DirtyEntry>,
    callbacks: Vec<CallbackEntry>,
    sends: Option<SendSpec>,
    scope: TypeScope,
}

impl SpecsBuilder {
    /// A builder for the spec named `name`; the name is the module name
    /// unless a `module` declaration says otherwise.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
            interface: None,
            state_type: None,
            functions: Vec::new(),
            structs: Vec::new(),
            enums: Vec::new(),
            dirty: Vec::new(),
            callbacks: Vec::new(),
            sends: None,
            scope: TypeScope::new(),
        }
    }

    /// Normalize and apply one raw declaration.
    pub fn add(&mut self, decl: &Declaration) -> DeclResult<()> {
        let record = normalize(decl)?;
        self.apply(record, decl.span)
    }

    /// Apply a normalized record.
    pub fn apply(&mut self, record: Record, span: Span) -> DeclResult<()> {
        match record {
            Record::Module(module) => {
                if let Some(previous) = self.module.replace(module) {
                    log::warn!("{}: module '{previous}' redeclared", self.name);
                }
            }
            Record::Interface(interface) => {
                if self.interface.is_some() {
                    log::warn!("{}: interface redeclared", self.name);
                }
                self.interface = interface;
            }
            Record::StateType(state_type) => {
                if let Some(previous) = self.state_type.replace(state_type) {
                    log::warn!("{}: state_type '{previous}' redeclared", self.name);
                }
            }
            Record::Function(function) => self.add_function(function)?,
            Record::Struct(def) => self.add_struct(def, span)?,
            Record::Enum(def) => self.add_enum(def, span)?,
            Record::Dirty(entries) => {
                for entry in entries {
                    self.add_dirty(entry);
                }
            }
            Record::Callback(entry) => self.add_callback(entry),
            Record::Sends(clause) => self.add_sends(clause)?,
        }
        Ok(())
    }

    fn add_function(&mut self, function: RawFunction) -> DeclResult<()> {
        let arity = function.args.len();
        if self
            .functions
            .iter()
            .any(|f| f.name == function.name && f.arity == arity)
        {
            return Err(DeclError::DuplicateFunction {
                name: function.name,
                arity,
                span: function.span,
            });
        }
        self.scope.resolve_function(&function)?;
        let results = index_results(&function.name, function.results)?;
        log::debug!(
            "{}: function {}/{arity} with {} result clause(s)",
            self.name,
            function.name,
            results.len()
        );
        self.functions.push(FunctionSpec {
            name: function.name,
            arity,
            args: function.args,
            results,
        });
        Ok(())
    }

    fn check_alias_free(&self, alias: &str, span: Span) -> DeclResult<()> {
        if self.scope.is_declared(alias) {
            return Err(DeclError::DuplicateTypeAlias {
                alias: alias.to_string(),
                span,
            });
        }
        Ok(())
    }

    fn add_struct(&mut self, def: StructDef, span: Span) -> DeclResult<()> {
        self.check_alias_free(&def.alias, span)?;
        self.scope.resolve_struct(&def, span)?;
        log::debug!("{}: struct {} ({} fields)", self.name, def.alias, def.fields.len());
        self.scope.declare(&def.alias);
        self.structs.push(def);
        Ok(())
    }

    fn add_enum(&mut self, def: EnumDef, span: Span) -> DeclResult<()> {
        self.check_alias_free(&def.alias, span)?;
        log::debug!("{}: enum {} ({} variants)", self.name, def.alias, def.variants.len());
        self.scope.declare(&def.alias);
        self.enums.push(def);
        Ok(())
    }

    fn add_dirty(&mut self, entry: DirtyEntry) {
        let existing = self
            .dirty
            .iter_mut()
            .find(|d| d.function_name == entry.function_name && d.arity == entry.arity);
        match existing {
            Some(slot) => {
                log::debug!(
                    "{}: dirty {}/{} overwritten ({} -> {})",
                    self.name,
                    entry.function_name,
                    entry.arity,
                    slot.kind.as_str(),
                    entry.kind.as_str()
                );
                *slot = entry;
            }
            None => self.dirty.push(entry),
        }
    }

    fn add_callback(&mut self, entry: CallbackEntry) {
        match self.callbacks.iter_mut().find(|c| c.hook == entry.hook) {
            Some(slot) => {
                log::warn!(
                    "{}: callback :{} redeclared, '{}' replaces '{}'",
                    self.name,
                    entry.hook.as_str(),
                    entry.function_name,
                    slot.function_name
                );
                *slot = entry;
            }
            None => self.callbacks.push(entry),
        }
    }

    fn add_sends(&mut self, clause: RawClause) -> DeclResult<()> {
        let value_types = clause
            .items
            .iter()
            .filter(|item| !item.is_label())
            .map(|item| &item.ty);
        self.scope.resolve_clause_types(value_types, SENDS, clause.span)?;
        let send = index_send(clause)?;
        if self.sends.replace(send).is_some() {
            log::warn!("{}: sends redeclared", self.name);
        }
        Ok(())
    }

    /// Seal the builder into the immutable IR.
    pub fn finish(self) -> Specs {
        for entry in &self.dirty {
            let declared = self
                .functions
                .iter()
                .any(|f| f.name == entry.function_name && f.arity == entry.arity);
            if !declared {
                log::warn!(
                    "{}: dirty entry for undeclared function {}/{}",
                    self.name,
                    entry.function_name,
                    entry.arity
                );
            }
        }
        Specs {
            module: self.module.unwrap_or(self.name),
            interface: self.interface,
            state_type: self.state_type,
            functions: self.functions,
            structs: self.structs,
            enums: self.enums,
            dirty: self.dirty,
            callbacks: self.callbacks,
            sends: self.sends,
        }
    }
}

/// Build the IR for one spec from its declarations, in order.
pub fn build_specs(name: &str, declarations: &[Declaration]) -> DeclResult<Specs> {
    let mut builder = SpecsBuilder::new(name);
    for decl in declarations {
        builder.add(decl)?;
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridgespec_parser::parse_source;
    use bridgespec_types::ir::{DirtyKind, Hook};
    use bridgespec_types::SourceFile;

    fn build(source: &str) -> DeclResult<Specs> {
        let sf = SourceFile::new("example.bspec", source);
        let parsed = parse_source(&sf);
        assert!(!parsed.errors.has_errors(), "{}", parsed.errors);
        build_specs("example", &parsed.declarations)
    }

    #[test]
    fn test_module_defaults_to_spec_name() {
        assert_eq!(build("spec f() :: :ok").unwrap().module, "example");
        assert_eq!(build("module My.Example").unwrap().module, "My.Example");
    }

    #[test]
    fn test_duplicate_function_arity() {
        let err = build("spec f(a :: int) :: :ok\nspec f(b :: int) :: :error").unwrap_err();
        assert!(
            matches!(err, DeclError::DuplicateFunction { ref name, arity: 1, .. } if name == "f")
        );
    }

    #[test]
    fn test_same_name_different_arity() {
        let specs = build("spec f() :: :ok\nspec f(a :: int) :: :ok").unwrap();
        assert_eq!(specs.functions.len(), 2);
        assert!(specs.function("f", 0).is_some());
        assert!(specs.function("f", 1).is_some());
    }

    #[test]
    fn test_duplicate_type_alias_across_structs_and_enums() {
        let err = build("type t :: %T{id: int}\ntype t :: :a | :b").unwrap_err();
        assert!(matches!(err, DeclError::DuplicateTypeAlias { ref alias, .. } if alias == "t"));
    }

    #[test]
    fn test_callback_last_wins() {
        let specs = build("callback :load\ncallback :load, :boot").unwrap();
        assert_eq!(specs.callbacks.len(), 1);
        assert_eq!(
            specs.callback(Hook::Load).map(|c| c.function_name.as_str()),
            Some("boot")
        );
    }

    #[test]
    fn test_dirty_last_wins_keeps_position() {
        let specs = build(
            "spec a() :: :ok\nspec b() :: :ok\ndirty :cpu, a: 0, b: 0\ndirty :io, a: 0",
        )
        .unwrap();
        let entries: Vec<(&str, DirtyKind)> = specs
            .dirty
            .iter()
            .map(|d| (d.function_name.as_str(), d.kind))
            .collect();
        assert_eq!(entries, vec![("a", DirtyKind::Io), ("b", DirtyKind::Cpu)]);
    }

    #[test]
    fn test_dirty_for_undeclared_function_is_kept() {
        let specs = build("dirty :cpu, ghost: 2").unwrap();
        assert_eq!(specs.dirty_kind("ghost", 2), Some(DirtyKind::Cpu));
    }

    #[test]
    fn test_first_error_in_declaration_order() {
        let err = build("spec f() :: {x :: int}\ntype t :: %T{a: nope}").unwrap_err();
        assert!(matches!(err, DeclError::EmptyLabelSet { .. }));
    }

    #[test]
    fn test_function_may_use_type_declared_earlier() {
        assert!(build("type s :: %S{id: int}\nspec f(x :: s) :: {:ok :: label, y :: [s]}").is_ok());
        let err = build("spec f(x :: s) :: :ok\ntype s :: %S{id: int}").unwrap_err();
        assert!(
            matches!(err, DeclError::UnknownType { ref name, ref used_in, .. } if name == "s" && used_in == "f")
        );
    }

    #[test]
    fn test_sends_last_wins() {
        let specs = build("sends {:a :: label}\nsends {:b :: label, n :: int}").unwrap();
        let sends = specs.sends.unwrap();
        assert_eq!(sends.accessor_name, "send_b");
        assert_eq!(sends.items.len(), 2);
    }

    #[test]
    fn test_empty_interface_list_is_absent() {
        let specs = build("interface NIF\ninterface []").unwrap();
        assert_eq!(specs.interface, None);
    }
}
