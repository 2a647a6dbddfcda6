//! Collection of accumulated diagnostics (spec.md §7: analysis is
//! recovering, diagnostics accumulate and the pass continues).

use super::message::{Diagnostic, DiagnosticKind};
use crate::span::Span;

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    messages: Vec<Diagnostic>,
}

/// Builder for a single diagnostic: `diag.report(kind, span).message(..).emit()`.
#[must_use = "diagnostic not recorded, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    kind: DiagnosticKind,
    span: Span,
    message: String,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, kind: DiagnosticKind, span: Span) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            kind,
            span,
            message: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn error_count(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }
}

impl<'a> DiagnosticBuilder<'a> {
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn emit(self) {
        self.diagnostics
            .messages
            .push(Diagnostic::new(self.kind, self.span, self.message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_in_report_order() {
        let mut diags = Diagnostics::new();
        diags
            .report(DiagnosticKind::UndeclaredIdentifier, Span::new(0, 3))
            .message("foo")
            .emit();
        diags
            .report(DiagnosticKind::TypeMismatch, Span::new(4, 7))
            .message("bar")
            .emit();
        assert_eq!(diags.len(), 2);
        let msgs: Vec<_> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(msgs, vec!["foo", "bar"]);
    }
}
