use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum number of errors stored before the lexer and parser give up.
pub const MAX_ERRORS: usize = 20;

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Malformed text or declaration shape.
    Grammar,
    /// Type references that do not resolve.
    Resolution,
    /// Duplicates and per-clause invariants.
    Uniqueness,
    /// No backend could be chosen for the module.
    Selection,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Grammar => "grammar",
            Self::Resolution => "resolution",
            Self::Uniqueness => "uniqueness",
            Self::Selection => "selection",
        };
        f.write_str(name)
    }
}

/// Numeric error code (E100–E499).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Grammar (E100–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNCLOSED_DELIMITER: Self = Self(101);
    pub const NESTING_TOO_DEEP: Self = Self(102);
    pub const MALFORMED_DECLARATION: Self = Self(110);
    pub const INVALID_DIRTY_KIND: Self = Self(111);
    pub const INVALID_HOOK: Self = Self(112);

    // ── Resolution (E200–E299) ──
    pub const UNKNOWN_TYPE: Self = Self(200);

    // ── Uniqueness (E300–E399) ──
    pub const DUPLICATE_FUNCTION: Self = Self(300);
    pub const DUPLICATE_ACCESSOR_NAME: Self = Self(301);
    pub const DUPLICATE_TYPE_ALIAS: Self = Self(302);
    pub const EMPTY_LABEL_SET: Self = Self(303);
    pub const DUPLICATE_RESULT_NAME: Self = Self(304);

    // ── Selection (E400–E499) ──
    pub const INTERFACE_NOT_SPECIFIED: Self = Self(400);
    pub const UNKNOWN_BACKEND: Self = Self(401);

    pub fn category(self) -> ErrorCategory {
        match self.0 {
            200..=299 => ErrorCategory::Resolution,
            300..=399 => ErrorCategory::Uniqueness,
            400..=499 => ErrorCategory::Selection,
            _ => ErrorCategory::Grammar,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A structured compiler error, ready to be rendered or serialized.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{file}:{span}: {code} [{category}] {message}")]
pub struct SpecError {
    /// Spec name the error belongs to.
    pub file: String,
    pub code: ErrorCode,
    /// Derived from `code`.
    pub category: ErrorCategory,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    /// The offending source line, for context.
    pub source_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl SpecError {
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Errors collected while compiling one spec file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompileErrors {
    pub errors: Vec<SpecError>,
    pub total_errors: usize,
}

impl CompileErrors {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A collection holding exactly one error.
    pub fn single(error: SpecError) -> Self {
        let mut errors = Self::empty();
        errors.push_error(error);
        errors
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Whether the [`MAX_ERRORS`] cap has been reached.
    pub fn is_full(&self) -> bool {
        self.total_errors >= MAX_ERRORS
    }

    /// Record an error. Only the first [`MAX_ERRORS`] are stored; all are counted.
    pub fn push_error(&mut self, error: SpecError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    pub fn first(&self) -> Option<&SpecError> {
        self.errors.first()
    }
}

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            writeln!(f, "{error}")?;
        }
        if self.total_errors > self.errors.len() {
            writeln!(f, "... and {} more", self.total_errors - self.errors.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SpecError {
        SpecError::new(
            "example",
            ErrorCode::UNKNOWN_TYPE,
            "unknown type 'my_struct' used in 'outer_struct'",
            Span::new(3, 22, 3, 30),
            "type outer_struct :: %Outer{nested_struct: my_struct}",
        )
    }

    #[test]
    fn test_code_categories() {
        assert_eq!(ErrorCode::MALFORMED_DECLARATION.category(), ErrorCategory::Grammar);
        assert_eq!(ErrorCode::INVALID_HOOK.category(), ErrorCategory::Grammar);
        assert_eq!(ErrorCode::UNKNOWN_TYPE.category(), ErrorCategory::Resolution);
        assert_eq!(ErrorCode::EMPTY_LABEL_SET.category(), ErrorCategory::Uniqueness);
        assert_eq!(
            ErrorCode::INTERFACE_NOT_SPECIFIED.category(),
            ErrorCategory::Selection
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::DUPLICATE_TYPE_ALIAS.to_string(), "E302");
        assert_eq!(
            sample().to_string(),
            "example:3:22: E200 [resolution] unknown type 'my_struct' used in 'outer_struct'"
        );
    }

    #[test]
    fn test_json_shape() {
        let err = sample().with_suggestion("declare 'my_struct' before 'outer_struct'");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"line\":3"));
        assert!(json.contains("\"column\":22"));
        assert!(json.contains("\"end_column\":30"));
        assert!(json.contains("\"category\":\"resolution\""));
        assert!(json.contains("\"suggestion\""));

        let back: SpecError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_error_cap() {
        let mut errs = CompileErrors::empty();
        for i in 0..25 {
            errs.push_error(SpecError::new(
                "example",
                ErrorCode::UNEXPECTED_TOKEN,
                format!("error {i}"),
                Span::point(i + 1, 1),
                "",
            ));
        }
        assert_eq!(errs.errors.len(), MAX_ERRORS);
        assert_eq!(errs.total_errors, 25);
        assert!(errs.is_full());
        assert!(errs.to_string().ends_with("... and 5 more\n"));
    }
}
