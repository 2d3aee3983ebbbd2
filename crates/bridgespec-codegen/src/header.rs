//! The header surface shared by every backend.
//!
//! Both backends declare the same symbols; they differ in the runtime header
//! they pull in and in what a result accessor returns.

use bridgespec_types::ir::{CallbackEntry, FunctionSpec, Hook, ResultClause, Specs, TypeRef};

use crate::ctypes::{
    accessor_c_name, c_ident, enum_constant, impl_name, include_guard, value_decls,
};
use crate::writer::CWriter;

/// Per-backend parameters of the shared header.
#[derive(Debug, Clone, Copy)]
pub struct Flavor {
    pub backend: &'static str,
    /// `#include <...>` target of the backend runtime.
    pub runtime_header: &'static str,
    /// Return type of implementations and result accessors.
    pub result_type: &'static str,
    /// Extra prototypes the runtime expects the generated source to define.
    pub runtime_prototypes: &'static [&'static str],
}

/// Comment banner stamped on every generated file.
pub fn banner(w: &mut CWriter, name: &str, backend: &str, specs: &Specs) {
    w.raw(&format!(
        "/* Generated by bridgespec from {name}.bspec. Do not edit."
    ));
    w.raw(&format!(" * module: {}", specs.module));
    w.raw(&format!(" * backend: {backend}"));
    w.raw(&format!(" * ir-digest: {}", specs.digest()));
    w.raw(" */");
}

/// Path of the hand-written header, relative to `_generated/<backend>/`.
pub fn user_header_path(name: &str) -> String {
    format!("../../{name}.h")
}

fn params(leading: &[&str], values: Vec<String>) -> String {
    let mut all: Vec<String> = leading.iter().map(|s| s.to_string()).collect();
    all.extend(values);
    all.join(", ")
}

/// `BridgeTerm foo(BridgeEnv *env, int count)`
pub fn impl_signature(flavor: &Flavor, specs: &Specs, function: &FunctionSpec) -> String {
    let values = function
        .args
        .iter()
        .flat_map(|arg| value_decls(specs, &arg.name, &arg.ty))
        .collect();
    format!(
        "{} {}({})",
        flavor.result_type,
        impl_name(specs, function),
        params(&["BridgeEnv *env"], values)
    )
}

/// `BridgeTerm foo_result_ok(BridgeEnv *env, int answer)`
pub fn accessor_signature(
    flavor: &Flavor,
    specs: &Specs,
    function: &FunctionSpec,
    clause: &ResultClause,
) -> String {
    let values = clause
        .values()
        .flat_map(|item| value_decls(specs, &item.name, &item.ty))
        .collect();
    format!(
        "{} {}({})",
        flavor.result_type,
        accessor_c_name(specs, function, clause),
        params(&["BridgeEnv *env"], values)
    )
}

/// `int send_msg(BridgeEnv *env, BridgePid pid, int flags, int num)`
pub fn send_signature(specs: &Specs, send: &ResultClause) -> String {
    let values = send
        .values()
        .flat_map(|item| value_decls(specs, &item.name, &item.ty))
        .collect();
    format!(
        "int {}({})",
        c_ident(&send.accessor_name),
        params(&["BridgeEnv *env", "BridgePid pid", "int flags"], values)
    )
}

/// Hook-specific signature of a lifecycle callback.
pub fn callback_signature(entry: &CallbackEntry) -> String {
    let name = c_ident(&entry.function_name);
    match entry.hook {
        Hook::Load => format!("int {name}(BridgeEnv *env, void **priv_data)"),
        Hook::Upgrade => {
            format!("int {name}(BridgeEnv *env, void **priv_data, void **old_priv_data)")
        }
        Hook::Unload => format!("void {name}(BridgeEnv *env, void *priv_data)"),
        Hook::Main => format!("int {name}(int argc, char **argv)"),
    }
}

/// Generate the full header for one spec.
pub fn generate_header(flavor: &Flavor, name: &str, specs: &Specs) -> String {
    let mut w = CWriter::new();
    banner(&mut w, name, flavor.backend, specs);
    let guard = include_guard(name, flavor.backend);
    w.raw(&format!("#ifndef {guard}"));
    w.raw(&format!("#define {guard}"));
    w.blank();
    w.raw("#include <stdint.h>");
    w.raw(&format!("#include <{}>", flavor.runtime_header));
    w.blank();

    if let Some(state) = &specs.state_type {
        let state = c_ident(state);
        w.raw(&format!("typedef struct {state} {state};"));
        w.blank();
    }
    w.raw(&format!("#include \"{}\"", user_header_path(name)));
    w.blank();

    write_types(&mut w, specs);
    write_prototypes(&mut w, flavor, specs);

    w.raw(&format!("#endif /* {guard} */"));
    w.finish()
}

fn write_types(w: &mut CWriter, specs: &Specs) {
    for def in &specs.enums {
        let alias = c_ident(&def.alias);
        w.open_block(&format!("typedef enum {alias}_t"));
        for variant in &def.variants {
            w.line(&format!("{},", enum_constant(&def.alias, variant)));
        }
        w.close_block_with(&format!(" {alias};"));
        w.blank();
    }

    if specs.structs.is_empty() {
        return;
    }
    for def in &specs.structs {
        let alias = c_ident(&def.alias);
        w.raw(&format!("typedef struct {alias}_t {alias};"));
    }
    w.blank();
    for def in &specs.structs {
        w.open_block(&format!("struct {}_t", c_ident(&def.alias)));
        for field in &def.fields {
            for decl in value_decls(specs, &field.name, &field.ty) {
                w.line(&format!("{decl};"));
            }
        }
        w.close_block_with(";");
        w.blank();
    }
}

fn write_prototypes(w: &mut CWriter, flavor: &Flavor, specs: &Specs) {
    if !specs.functions.is_empty() {
        w.raw("/* native implementations */");
        for function in &specs.functions {
            w.raw(&format!("{};", impl_signature(flavor, specs, function)));
        }
        w.blank();

        w.raw("/* result accessors */");
        for function in &specs.functions {
            for clause in &function.results {
                w.raw(&format!("{};", accessor_signature(flavor, specs, function, clause)));
            }
        }
        w.blank();
    }

    if let Some(send) = &specs.sends {
        w.raw("/* messages */");
        w.raw(&format!("{};", send_signature(specs, send)));
        w.blank();
    }

    if !specs.callbacks.is_empty() {
        w.raw("/* lifecycle callbacks */");
        for entry in &specs.callbacks {
            w.raw(&format!("{};", callback_signature(entry)));
        }
        w.blank();
    }

    if !flavor.runtime_prototypes.is_empty() {
        w.raw("/* runtime entry points */");
        for prototype in flavor.runtime_prototypes {
            w.raw(&format!("{prototype};"));
        }
        w.blank();
    }
}

/// Zero-initialized locals for one value, e.g. `int count = {0};`.
pub fn value_locals(specs: &Specs, name: &str, ty: &TypeRef) -> Vec<String> {
    value_decls(specs, name, ty)
        .into_iter()
        .map(|decl| {
            let init = if decl.contains('*') { "NULL" } else { "{0}" };
            format!("{decl} = {init};")
        })
        .collect()
}
