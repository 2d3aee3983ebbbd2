//! bridgespec code generators: turn a resolved [`Specs`] into C text.
//!
//! # Output layout
//!
//! For a spec named `example` the caller writes the artifacts to
//! `_generated/<backend>/example.h` and `example.c`. The generated header
//! includes the hand-written `../../example.h`, so user code sits next to
//! the spec file.
//!
//! # Backends
//!
//! - [`NifBackend`] (`nif`): an in-process native library with an export
//!   table, dirty-scheduler flags and load/upgrade/unload hooks.
//! - [`CNodeBackend`] (`cnode`): a standalone node with a request dispatcher
//!   and a `main` entry point.
//!
//! Both emit byte-identical text for identical IR and stamp the IR digest
//! into a banner comment.
//!
//! [`Specs`]: bridgespec_types::ir::Specs

pub mod cnode;
pub mod ctypes;
pub mod header;
pub mod nif;
pub mod writer;

pub use cnode::CNodeBackend;
pub use nif::NifBackend;

use bridgespec_types::Backend;

/// Every backend shipped with bridgespec.
pub fn builtin_backends() -> Vec<Box<dyn Backend>> {
    vec![Box::new(NifBackend), Box::new(CNodeBackend)]
}
