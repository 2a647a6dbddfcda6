//! Diagnostic kinds and message types.

use crate::span::Span;

/// The closed diagnostic taxonomy of spec.md §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DiagnosticKind {
    #[error("Syntax")]
    Syntax,
    #[error("DuplicateDeclaration")]
    DuplicateDeclaration,
    #[error("UndeclaredIdentifier")]
    UndeclaredIdentifier,
    #[error("UninitializedRead")]
    UninitializedRead,
    #[error("TypeMismatch")]
    TypeMismatch,
    #[error("ArityMismatch")]
    ArityMismatch,
    #[error("BadCondition")]
    BadCondition,
    #[error("BreakContinueOutsideLoop")]
    BreakContinueOutsideLoop,
    #[error("ReturnOutsideFunction")]
    ReturnOutsideFunction,
    #[error("ReturnTypeMismatch")]
    ReturnTypeMismatch,
    #[error("MissingReturn")]
    MissingReturn,
    #[error("BadPropertyAccess")]
    BadPropertyAccess,
    #[error("BadMethodCall")]
    BadMethodCall,
    #[error("BadInheritance")]
    BadInheritance,
    #[error("ThisOutsideClass")]
    ThisOutsideClass,
    #[error("AssignToImmutable")]
    AssignToImmutable,
    #[error("BadArrayLiteral")]
    BadArrayLiteral,
    #[error("BadIndex")]
    BadIndex,
    #[error("OverrideSignatureMismatch")]
    OverrideSignatureMismatch,
}

/// A single diagnostic: kind, message, and source position (spec.md §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub(crate) fn new(kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }
}
