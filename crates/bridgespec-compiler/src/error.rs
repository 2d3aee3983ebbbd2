//! Compiler error types.
//!
//! Every error is fatal to the spec file being compiled. Variants map onto a
//! stable [`ErrorCode`] so callers can render them as [`SpecError`]s next to
//! lexer and parser errors.

use bridgespec_types::{ErrorCode, SourceFile, Span, SpecError};
use thiserror::Error;

/// Errors raised after parsing: normalization, resolution, indexing,
/// assembly and backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclError {
    /// A declaration's payload does not have the shape its kind requires.
    #[error("malformed '{kind}' declaration: {reason} in `{fragment}`")]
    MalformedDeclaration {
        kind: String,
        fragment: String,
        reason: String,
        span: Span,
    },

    #[error("invalid dirty kind '{kind}', expected one of: cpu, io")]
    InvalidDirtyKind { kind: String, span: Span },

    #[error("invalid callback hook '{hook}', expected one of: load, upgrade, unload, main")]
    InvalidHook { hook: String, span: Span },

    /// A type name that is neither primitive nor declared earlier.
    #[error("unknown type '{name}' used in '{used_in}'")]
    UnknownType {
        name: String,
        used_in: String,
        span: Span,
    },

    #[error("result clause #{clause_index} of '{function}' has no label")]
    EmptyLabelSet {
        function: String,
        clause_index: usize,
        span: Span,
    },

    #[error("'{function}' has two result clauses with the same accessor '{name}'")]
    DuplicateAccessorName {
        function: String,
        name: String,
        span: Span,
    },

    #[error("'{function}' returns two values named '{name}' in one clause")]
    DuplicateResultName {
        function: String,
        name: String,
        span: Span,
    },

    #[error("function '{name}/{arity}' is declared more than once")]
    DuplicateFunction {
        name: String,
        arity: usize,
        span: Span,
    },

    #[error("type alias '{alias}' is declared more than once")]
    DuplicateTypeAlias { alias: String, span: Span },

    #[error("no interface declared for module '{module}' and none found in project configuration")]
    InterfaceNotSpecified { module: String },

    #[error("no backend registered for interface '{tag}'")]
    UnknownBackend { tag: String },
}

impl DeclError {
    pub fn code(&self) -> ErrorCode {
        match self {
            DeclError::MalformedDeclaration { .. } => ErrorCode::MALFORMED_DECLARATION,
            DeclError::InvalidDirtyKind { .. } => ErrorCode::INVALID_DIRTY_KIND,
            DeclError::InvalidHook { .. } => ErrorCode::INVALID_HOOK,
            DeclError::UnknownType { .. } => ErrorCode::UNKNOWN_TYPE,
            DeclError::EmptyLabelSet { .. } => ErrorCode::EMPTY_LABEL_SET,
            DeclError::DuplicateAccessorName { .. } => ErrorCode::DUPLICATE_ACCESSOR_NAME,
            DeclError::DuplicateResultName { .. } => ErrorCode::DUPLICATE_RESULT_NAME,
            DeclError::DuplicateFunction { .. } => ErrorCode::DUPLICATE_FUNCTION,
            DeclError::DuplicateTypeAlias { .. } => ErrorCode::DUPLICATE_TYPE_ALIAS,
            DeclError::InterfaceNotSpecified { .. } => ErrorCode::INTERFACE_NOT_SPECIFIED,
            DeclError::UnknownBackend { .. } => ErrorCode::UNKNOWN_BACKEND,
        }
    }

    /// Source location, when the error is tied to a declaration.
    pub fn span(&self) -> Option<Span> {
        match self {
            DeclError::MalformedDeclaration { span, .. }
            | DeclError::InvalidDirtyKind { span, .. }
            | DeclError::InvalidHook { span, .. }
            | DeclError::UnknownType { span, .. }
            | DeclError::EmptyLabelSet { span, .. }
            | DeclError::DuplicateAccessorName { span, .. }
            | DeclError::DuplicateResultName { span, .. }
            | DeclError::DuplicateFunction { span, .. }
            | DeclError::DuplicateTypeAlias { span, .. } => Some(*span),
            DeclError::InterfaceNotSpecified { .. } | DeclError::UnknownBackend { .. } => None,
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            DeclError::UnknownType { name, used_in, .. } => Some(format!(
                "declare type '{name}' before '{used_in}', or use a primitive type"
            )),
            DeclError::EmptyLabelSet { .. } => {
                Some("start the clause with a label, e.g. {:ok :: label, ...}".to_string())
            }
            DeclError::InterfaceNotSpecified { module } => Some(format!(
                "add `interface NIF` to the spec, or list '{module}' in the project configuration"
            )),
            _ => None,
        }
    }

    /// Render as a structured error against the file it came from.
    pub fn to_spec_error(&self, source_file: &SourceFile) -> SpecError {
        let span = self.span().unwrap_or_else(|| Span::point(1, 1));
        let source_line = self
            .span()
            .and_then(|s| source_file.line(s.start_line))
            .unwrap_or("");
        let error = SpecError::new(
            &source_file.name,
            self.code(),
            self.to_string(),
            span,
            source_line,
        );
        match self.suggestion() {
            Some(suggestion) => error.with_suggestion(suggestion),
            None => error,
        }
    }
}

/// Compiler result type alias.
pub type DeclResult<T> = Result<T, DeclError>;
