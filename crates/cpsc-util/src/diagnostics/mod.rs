mod collection;
mod message;
mod printer;

pub use collection::{DiagnosticBuilder, Diagnostics};
pub use message::{Diagnostic, DiagnosticKind};
pub use printer::DiagnosticsPrinter;
