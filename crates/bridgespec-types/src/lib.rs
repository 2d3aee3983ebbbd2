//! Shared types for the bridgespec compiler.
//!
//! This crate defines source spans, structured errors, the raw declaration
//! tree produced by the parser, the resolved IR handed to backends, and the
//! [`Backend`] capability every code generator implements.

mod error;
mod span;
pub mod ast;
pub mod backend;
pub mod ir;

pub use backend::{Backend, GeneratedCode};
pub use error::{CompileErrors, ErrorCategory, ErrorCode, SpecError, MAX_ERRORS};
pub use span::{SourceFile, Span};

/// Result type used by the lexer and parser stages.
pub type Result<T> = std::result::Result<T, SpecError>;
