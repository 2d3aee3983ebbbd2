//! In-process backend: a native library loaded into the managed runtime.
//!
//! Runtime contract (`bridgespec/nif.h`): `bridge_make_<type>` builds a term,
//! `bridge_get_<type>` decodes one and returns non-zero on success, and
//! `bridge_alloc` hands out scratch memory released when the call returns.

use bridgespec_types::ir::{DirtyKind, FunctionSpec, Hook, ResultClause, Specs, TypeRef};
use bridgespec_types::Backend;

use crate::ctypes::{c_ident, c_string, enum_constant, helper, impl_name, length_name};
use crate::header::{
    accessor_signature, banner, generate_header, send_signature, value_locals, Flavor,
};
use crate::writer::CWriter;

const FLAVOR: Flavor = Flavor {
    backend: "nif",
    runtime_header: "bridgespec/nif.h",
    result_type: "BridgeTerm",
    runtime_prototypes: &[],
};

/// Generates native-function libraries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NifBackend;

impl Backend for NifBackend {
    fn name(&self) -> &str {
        FLAVOR.backend
    }

    fn generate_header(&self, name: &str, specs: &Specs) -> String {
        generate_header(&FLAVOR, name, specs)
    }

    fn generate_source(&self, name: &str, specs: &Specs) -> String {
        let mut source = NifSource {
            specs,
            w: CWriter::new(),
            counter: 0,
        };
        source.emit(name);
        source.w.finish()
    }
}

struct NifSource<'a> {
    specs: &'a Specs,
    w: CWriter,
    /// Suffix for block-local loop variables.
    counter: usize,
}

impl NifSource<'_> {
    fn emit(&mut self, name: &str) {
        banner(&mut self.w, name, FLAVOR.backend, self.specs);
        self.w.raw(&format!("#include \"{name}.h\""));
        self.w.blank();

        let specs = self.specs;
        self.emit_enum_helpers();
        self.emit_struct_helpers();
        for function in &specs.functions {
            for clause in &function.results {
                self.emit_accessor(function, clause);
            }
        }
        if let Some(send) = &specs.sends {
            self.emit_send(send);
        }
        for function in &specs.functions {
            self.emit_export(function);
        }
        self.emit_export_table();
        self.emit_init();
    }

    fn fresh(&mut self) -> usize {
        self.counter += 1;
        self.counter
    }

    // ── conversions ──────────────────────────────────────────────────────────

    /// `dst = <term for src>;`, expanding lists into a loop.
    fn encode(&mut self, ty: &TypeRef, src: &str, dst: &str) {
        match ty {
            TypeRef::List(inner) => {
                let n = self.fresh();
                let len = length_name(src);
                self.w.open_block("");
                self.w.line(&format!(
                    "BridgeTerm *items_{n} = bridge_alloc(sizeof(BridgeTerm) * {len});"
                ));
                self.w
                    .open_block(&format!("for (unsigned int i_{n} = 0; i_{n} < {len}; i_{n}++)"));
                self.w.line(&format!(
                    "items_{n}[i_{n}] = {}(env, {src}[i_{n}]);",
                    helper(self.specs, "make", inner)
                ));
                self.w.close_block();
                self.w
                    .line(&format!("{dst} = bridge_make_list(env, items_{n}, {len});"));
                self.w.close_block();
            }
            _ => self.w.line(&format!(
                "{dst} = {}(env, {src});",
                helper(self.specs, "make", ty)
            )),
        }
    }

    /// Decode `term` into `target`, running `on_fail` when it does not match.
    fn decode(&mut self, ty: &TypeRef, term: &str, target: &str, on_fail: &str) {
        match ty {
            TypeRef::List(inner) => {
                let n = self.fresh();
                let len = length_name(target);
                self.w.open_block("");
                self.w.line(&format!("BridgeTerm cell_{n} = {term};"));
                self.w.line(&format!("BridgeTerm head_{n};"));
                self.w.open_block(&format!(
                    "if (!bridge_get_list_length(env, {term}, &{len}))"
                ));
                self.w.line(on_fail);
                self.w.close_block();
                self.w.line(&format!(
                    "{target} = bridge_alloc(sizeof(*{target}) * {len});"
                ));
                self.w
                    .open_block(&format!("for (unsigned int i_{n} = 0; i_{n} < {len}; i_{n}++)"));
                self.w.open_block(&format!(
                    "if (!bridge_get_list_cell(env, cell_{n}, &head_{n}, &cell_{n}) || !{}(env, head_{n}, &{target}[i_{n}]))",
                    helper(self.specs, "get", inner)
                ));
                self.w.line(on_fail);
                self.w.close_block();
                self.w.close_block();
                self.w.close_block();
            }
            _ => {
                self.w.open_block(&format!(
                    "if (!{}(env, {term}, &{target}))",
                    helper(self.specs, "get", ty)
                ));
                self.w.line(on_fail);
                self.w.close_block();
            }
        }
    }

    /// Build the term of a clause into `dst`: a bare item, or a tuple.
    fn build_clause(&mut self, clause: &ResultClause, dst: &str) {
        let count = clause.items.len();
        self.w.line(&format!("BridgeTerm items[{count}];"));
        for (i, item) in clause.items.iter().enumerate() {
            match &item.label {
                Some(label) => self.w.line(&format!(
                    "items[{i}] = bridge_make_atom(env, {});",
                    c_string(label)
                )),
                None => self.encode(&item.ty, &c_ident(&item.name), &format!("items[{i}]")),
            }
        }
        if count == 1 {
            self.w.line(&format!("{dst} = items[0];"));
        } else {
            self.w
                .line(&format!("{dst} = bridge_make_tuple(env, items, {count});"));
        }
    }

    // ── user types ───────────────────────────────────────────────────────────

    fn emit_enum_helpers(&mut self) {
        let specs = self.specs;
        for def in &specs.enums {
            let alias = c_ident(&def.alias);
            self.w.open_block(&format!(
                "static BridgeTerm make_{alias}(BridgeEnv *env, {alias} value)"
            ));
            for variant in &def.variants {
                self.w.open_block(&format!(
                    "if (value == {})",
                    enum_constant(&def.alias, variant)
                ));
                self.w
                    .line(&format!("return bridge_make_atom(env, {});", c_string(variant)));
                self.w.close_block();
            }
            self.w.line("return bridge_make_atom(env, \"undefined\");");
            self.w.close_block();
            self.w.blank();

            self.w.open_block(&format!(
                "static int get_{alias}(BridgeEnv *env, BridgeTerm term, {alias} *out)"
            ));
            for variant in &def.variants {
                self.w.open_block(&format!(
                    "if (bridge_is_atom(env, term, {}))",
                    c_string(variant)
                ));
                self.w
                    .line(&format!("*out = {};", enum_constant(&def.alias, variant)));
                self.w.line("return 1;");
                self.w.close_block();
            }
            self.w.line("return 0;");
            self.w.close_block();
            self.w.blank();
        }
    }

    fn emit_struct_helpers(&mut self) {
        let specs = self.specs;
        if specs.structs.is_empty() {
            return;
        }
        for def in &specs.structs {
            let alias = c_ident(&def.alias);
            self.w.raw(&format!(
                "static BridgeTerm make_{alias}(BridgeEnv *env, {alias} value);"
            ));
            self.w.raw(&format!(
                "static int get_{alias}(BridgeEnv *env, BridgeTerm term, {alias} *out);"
            ));
        }
        self.w.blank();

        for def in &specs.structs {
            let alias = c_ident(&def.alias);
            let count = def.fields.len() + 1;

            self.w.open_block(&format!(
                "static BridgeTerm make_{alias}(BridgeEnv *env, {alias} value)"
            ));
            self.w.line(&format!("BridgeTerm keys[{count}];"));
            self.w.line(&format!("BridgeTerm values[{count}];"));
            self.w
                .line("keys[0] = bridge_make_atom(env, \"__struct__\");");
            self.w.line(&format!(
                "values[0] = bridge_make_atom(env, {});",
                c_string(&def.backing_name)
            ));
            for (i, field) in def.fields.iter().enumerate() {
                let slot = i + 1;
                self.w.line(&format!(
                    "keys[{slot}] = bridge_make_atom(env, {});",
                    c_string(&field.name)
                ));
                let src = format!("value.{}", c_ident(&field.name));
                self.encode(&field.ty, &src, &format!("values[{slot}]"));
            }
            self.w
                .line(&format!("return bridge_make_map(env, keys, values, {count});"));
            self.w.close_block();
            self.w.blank();

            self.w.open_block(&format!(
                "static int get_{alias}(BridgeEnv *env, BridgeTerm term, {alias} *out)"
            ));
            self.w.line("BridgeTerm field;");
            for field in &def.fields {
                self.w.open_block(&format!(
                    "if (!bridge_get_map_value(env, term, {}, &field))",
                    c_string(&field.name)
                ));
                self.w.line("return 0;");
                self.w.close_block();
                let target = format!("out->{}", c_ident(&field.name));
                self.decode(&field.ty, "field", &target, "return 0;");
            }
            self.w.line("return 1;");
            self.w.close_block();
            self.w.blank();
        }
    }

    // ── functions ────────────────────────────────────────────────────────────

    fn emit_accessor(&mut self, function: &FunctionSpec, clause: &ResultClause) {
        self.w
            .open_block(&accessor_signature(&FLAVOR, self.specs, function, clause));
        self.w.line("BridgeTerm result;");
        self.build_clause(clause, "result");
        self.w.line("return result;");
        self.w.close_block();
        self.w.blank();
    }

    fn emit_send(&mut self, send: &ResultClause) {
        self.w.open_block(&send_signature(self.specs, send));
        self.w.line("BridgeTerm message;");
        self.build_clause(send, "message");
        self.w
            .line("return bridge_send(env, &pid, message, flags);");
        self.w.close_block();
        self.w.blank();
    }

    fn emit_export(&mut self, function: &FunctionSpec) {
        let wrapper = export_name(function);
        self.w.open_block(&format!(
            "static BridgeTerm {wrapper}(BridgeEnv *env, int argc, const BridgeTerm argv[])"
        ));
        self.w.line("(void)argc;");
        for arg in &function.args {
            for local in value_locals(self.specs, &arg.name, &arg.ty) {
                self.w.line(&local);
            }
        }
        for (i, arg) in function.args.iter().enumerate() {
            let on_fail = format!(
                "return bridge_raise_badarg(env, {});",
                c_string(&arg.name)
            );
            self.decode(&arg.ty, &format!("argv[{i}]"), &c_ident(&arg.name), &on_fail);
        }

        let mut call_args = vec!["env".to_string()];
        for arg in &function.args {
            let name = c_ident(&arg.name);
            if arg.ty.is_list() {
                call_args.push(name.clone());
                call_args.push(length_name(&name));
            } else {
                call_args.push(name);
            }
        }
        self.w.line(&format!(
            "return {}({});",
            impl_name(self.specs, function),
            call_args.join(", ")
        ));
        self.w.close_block();
        self.w.blank();
    }

    fn emit_export_table(&mut self) {
        let specs = self.specs;
        self.w.open_block("static BridgeFunc bridge_funcs[] =");
        for function in &specs.functions {
            let flags = match specs.dirty_kind(&function.name, function.arity) {
                Some(DirtyKind::Cpu) => "BRIDGE_DIRTY_CPU",
                Some(DirtyKind::Io) => "BRIDGE_DIRTY_IO",
                None => "0",
            };
            self.w.line(&format!(
                "{{{}, {}, {}, {flags}}},",
                c_string(&function.name),
                function.arity,
                export_name(function)
            ));
        }
        self.w.line("{NULL, 0, NULL, 0},");
        self.w.close_block_with(";");
        self.w.blank();
    }

    fn emit_init(&mut self) {
        let hook_fn = |hook: Hook| {
            self.specs
                .callback(hook)
                .map(|c| c_ident(&c.function_name))
                .unwrap_or_else(|| "NULL".to_string())
        };
        let load = hook_fn(Hook::Load);
        let upgrade = hook_fn(Hook::Upgrade);
        let unload = hook_fn(Hook::Unload);
        self.w.raw(&format!(
            "BRIDGE_INIT({}, bridge_funcs, {}, {load}, {upgrade}, {unload})",
            c_string(&self.specs.module),
            self.specs.functions.len()
        ));
    }
}

/// Name of the argument-decoding wrapper registered in the export table.
fn export_name(function: &FunctionSpec) -> String {
    format!("export_{}_{}", c_ident(&function.name), function.arity)
}
