//! Shared low-level infrastructure for the Compiscript compiler: arena
//! handles, string interning, source spans, and diagnostics.

pub mod diagnostics;
pub mod ids;
pub mod interner;
pub mod span;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, DiagnosticsPrinter};
pub use ids::{ClassId, FunctionId, ScopeId, SymbolId};
pub use interner::{Interner, Symbol};
pub use span::{LineCol, LineIndex, Span};
