//! Out-of-process backend: a standalone node process speaking the runtime's
//! external term format.
//!
//! Runtime contract (`bridgespec/cnode.h`): `bridge_encode_<type>` appends to
//! a buffer, `bridge_decode_<type>` reads at `*index` and returns non-zero on
//! success. Incoming calls reach `bridge_dispatch` by name and arity.

use bridgespec_types::ir::{FunctionSpec, Hook, ResultClause, Specs, TypeRef};
use bridgespec_types::Backend;

use crate::ctypes::{c_ident, c_string, enum_constant, helper, impl_name, length_name};
use crate::header::{
    accessor_signature, banner, generate_header, send_signature, value_locals, Flavor,
};
use crate::writer::CWriter;

/// Entry point the runtime calls for every incoming request.
pub const DISPATCH_PROTOTYPE: &str =
    "int bridge_dispatch(BridgeEnv *env, const char *fun, int arity, const char *buf, int *index)";

const FLAVOR: Flavor = Flavor {
    backend: "cnode",
    runtime_header: "bridgespec/cnode.h",
    result_type: "int",
    runtime_prototypes: &[DISPATCH_PROTOTYPE],
};

/// Generates standalone node programs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CNodeBackend;

impl Backend for CNodeBackend {
    fn name(&self) -> &str {
        FLAVOR.backend
    }

    fn generate_header(&self, name: &str, specs: &Specs) -> String {
        generate_header(&FLAVOR, name, specs)
    }

    fn generate_source(&self, name: &str, specs: &Specs) -> String {
        let mut source = CNodeSource {
            specs,
            w: CWriter::new(),
            counter: 0,
        };
        source.emit(name);
        source.w.finish()
    }
}

struct CNodeSource<'a> {
    specs: &'a Specs,
    w: CWriter,
    counter: usize,
}

impl CNodeSource<'_> {
    fn emit(&mut self, name: &str) {
        let specs = self.specs;
        banner(&mut self.w, name, FLAVOR.backend, specs);
        self.w.raw("#include <string.h>");
        self.w.raw(&format!("#include \"{name}.h\""));
        self.w.blank();

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
            self.emit_wrapper(function);
        }
        self.emit_dispatch();
        self.emit_main();
    }

    fn fresh(&mut self) -> usize {
        self.counter += 1;
        self.counter
    }

    // ── conversions ──────────────────────────────────────────────────────────

    /// Append `src` to the buffer `out`.
    fn encode(&mut self, ty: &TypeRef, src: &str) {
        match ty {
            TypeRef::List(inner) => {
                let n = self.fresh();
                let len = length_name(src);
                self.w
                    .line(&format!("bridge_encode_list_header(out, {len});"));
                self.w
                    .open_block(&format!("for (unsigned int i_{n} = 0; i_{n} < {len}; i_{n}++)"));
                self.w.line(&format!(
                    "{}(out, {src}[i_{n}]);",
                    helper(self.specs, "encode", inner)
                ));
                self.w.close_block();
                self.w.line("bridge_encode_empty_list(out);");
            }
            _ => self
                .w
                .line(&format!("{}(out, {src});", helper(self.specs, "encode", ty))),
        }
    }

    /// Read the next term into `target`, running `on_fail` when it does not match.
    fn decode(&mut self, ty: &TypeRef, target: &str, on_fail: &str) {
        match ty {
            TypeRef::List(inner) => {
                let n = self.fresh();
                let len = length_name(target);
                self.w.open_block(&format!(
                    "if (!bridge_decode_list_header(buf, index, &{len}))"
                ));
                self.w.line(on_fail);
                self.w.close_block();
                self.w.line(&format!(
                    "{target} = bridge_alloc(sizeof(*{target}) * {len});"
                ));
                self.w
                    .open_block(&format!("for (unsigned int i_{n} = 0; i_{n} < {len}; i_{n}++)"));
                self.w.open_block(&format!(
                    "if (!{}(buf, index, &{target}[i_{n}]))",
                    helper(self.specs, "decode", inner)
                ));
                self.w.line(on_fail);
                self.w.close_block();
                self.w.close_block();
                self.w.open_block(&format!(
                    "if ({len} > 0 && !bridge_decode_list_tail(buf, index))"
                ));
                self.w.line(on_fail);
                self.w.close_block();
            }
            _ => {
                self.w.open_block(&format!(
                    "if (!{}(buf, index, &{target}))",
                    helper(self.specs, "decode", ty)
                ));
                self.w.line(on_fail);
                self.w.close_block();
            }
        }
    }

    /// Append a clause: a bare item, or a tuple of items.
    fn encode_clause(&mut self, clause: &ResultClause) {
        if clause.items.len() > 1 {
            self.w.line(&format!(
                "bridge_encode_tuple_header(out, {});",
                clause.items.len()
            ));
        }
        for item in &clause.items {
            match &item.label {
                Some(label) => self
                    .w
                    .line(&format!("bridge_encode_atom(out, {});", c_string(label))),
                None => self.encode(&item.ty, &c_ident(&item.name)),
            }
        }
    }

    // ── user types ───────────────────────────────────────────────────────────

    fn emit_enum_helpers(&mut self) {
        let specs = self.specs;
        for def in &specs.enums {
            let alias = c_ident(&def.alias);
            self.w.open_block(&format!(
                "static void encode_{alias}(BridgeBuffer *out, {alias} value)"
            ));
            for variant in &def.variants {
                self.w.open_block(&format!(
                    "if (value == {})",
                    enum_constant(&def.alias, variant)
                ));
                self.w
                    .line(&format!("bridge_encode_atom(out, {});", c_string(variant)));
                self.w.line("return;");
                self.w.close_block();
            }
            self.w.line("bridge_encode_atom(out, \"undefined\");");
            self.w.close_block();
            self.w.blank();

            self.w.open_block(&format!(
                "static int decode_{alias}(const char *buf, int *index, {alias} *out)"
            ));
            self.w.line("char *atom = NULL;");
            self.w.open_block("if (!bridge_decode_atom(buf, index, &atom))");
            self.w.line("return 0;");
            self.w.close_block();
            for variant in &def.variants {
                self.w.open_block(&format!(
                    "if (strcmp(atom, {}) == 0)",
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
                "static void encode_{alias}(BridgeBuffer *out, {alias} value);"
            ));
            self.w.raw(&format!(
                "static int decode_{alias}(const char *buf, int *index, {alias} *out);"
            ));
        }
        self.w.blank();

        for def in &specs.structs {
            let alias = c_ident(&def.alias);

            self.w.open_block(&format!(
                "static void encode_{alias}(BridgeBuffer *out, {alias} value)"
            ));
            self.w.line(&format!(
                "bridge_encode_map_header(out, {});",
                def.fields.len() + 1
            ));
            self.w.line("bridge_encode_atom(out, \"__struct__\");");
            self.w.line(&format!(
                "bridge_encode_atom(out, {});",
                c_string(&def.backing_name)
            ));
            for field in &def.fields {
                self.w
                    .line(&format!("bridge_encode_atom(out, {});", c_string(&field.name)));
                self.encode(&field.ty, &format!("value.{}", c_ident(&field.name)));
            }
            self.w.close_block();
            self.w.blank();

            self.w.open_block(&format!(
                "static int decode_{alias}(const char *buf, int *index, {alias} *out)"
            ));
            self.w.line("int arity = 0;");
            self.w.open_block("if (!bridge_decode_map_header(buf, index, &arity))");
            self.w.line("return 0;");
            self.w.close_block();
            self.w.open_block("for (int i = 0; i < arity; i++)");
            self.w.line("char *key = NULL;");
            self.w.open_block("if (!bridge_decode_atom(buf, index, &key))");
            self.w.line("return 0;");
            self.w.close_block();
            for field in &def.fields {
                self.w.open_block(&format!(
                    "if (strcmp(key, {}) == 0)",
                    c_string(&field.name)
                ));
                let target = format!("out->{}", c_ident(&field.name));
                self.decode(&field.ty, &target, "return 0;");
                self.w.line("continue;");
                self.w.close_block();
            }
            self.w.open_block("if (!bridge_skip_term(buf, index))");
            self.w.line("return 0;");
            self.w.close_block();
            self.w.close_block();
            self.w.line("return 1;");
            self.w.close_block();
            self.w.blank();
        }
    }

    // ── functions ────────────────────────────────────────────────────────────

    fn emit_accessor(&mut self, function: &FunctionSpec, clause: &ResultClause) {
        self.w
            .open_block(&accessor_signature(&FLAVOR, self.specs, function, clause));
        self.w.line("BridgeBuffer *out = bridge_reply_buffer(env);");
        self.encode_clause(clause);
        self.w.line("return bridge_reply(env);");
        self.w.close_block();
        self.w.blank();
    }

    fn emit_send(&mut self, send: &ResultClause) {
        self.w.open_block(&send_signature(self.specs, send));
        self.w.line("BridgeBuffer *out = bridge_send_buffer(env);");
        self.encode_clause(send);
        self.w.line("return bridge_send(env, &pid, flags);");
        self.w.close_block();
        self.w.blank();
    }

    fn emit_wrapper(&mut self, function: &FunctionSpec) {
        self.w.open_block(&format!(
            "static int {}(BridgeEnv *env, const char *buf, int *index)",
            wrapper_name(function)
        ));
        for arg in &function.args {
            for local in value_locals(self.specs, &arg.name, &arg.ty) {
                self.w.line(&local);
            }
        }
        for arg in &function.args {
            let on_fail = format!(
                "return bridge_reply_badarg(env, {});",
                c_string(&arg.name)
            );
            self.decode(&arg.ty, &c_ident(&arg.name), &on_fail);
        }
        if function.args.is_empty() {
            self.w.line("(void)buf;");
            self.w.line("(void)index;");
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

    fn emit_dispatch(&mut self) {
        let specs = self.specs;
        self.w.open_block(DISPATCH_PROTOTYPE);
        if specs.functions.is_empty() {
            self.w.line("(void)buf;");
            self.w.line("(void)index;");
        }
        for function in &specs.functions {
            self.w.open_block(&format!(
                "if (arity == {} && strcmp(fun, {}) == 0)",
                function.arity,
                c_string(&function.name)
            ));
            self.w.line(&format!(
                "return {}(env, buf, index);",
                wrapper_name(function)
            ));
            self.w.close_block();
        }
        self.w.line("return bridge_reply_undefined(env, fun, arity);");
        self.w.close_block();
        self.w.blank();
    }

    fn emit_main(&mut self) {
        self.w.open_block("int main(int argc, char **argv)");
        match self.specs.callback(Hook::Main) {
            Some(entry) => self.w.line(&format!(
                "return {}(argc, argv);",
                c_ident(&entry.function_name)
            )),
            None => self.w.line(&format!(
                "return bridge_cnode_main(argc, argv, {}, bridge_dispatch);",
                c_string(&self.specs.module)
            )),
        }
        self.w.close_block();
    }
}

fn wrapper_name(function: &FunctionSpec) -> String {
    format!("dispatch_{}_{}", c_ident(&function.name), function.arity)
}
