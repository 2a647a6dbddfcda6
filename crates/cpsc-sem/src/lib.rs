//! Symbol table, expression evaluator, and semantic analyzer for
//! Compiscript: resolves every name, assigns a type to every expression,
//! and lowers the parsed AST into the annotated tree `cpsc-tac` consumes.

pub mod analyzer;
pub mod checked;
mod eval;
pub mod symtab;
pub mod types;

pub use analyzer::analyze;
pub use checked::{
    CheckedClass, CheckedExpr, CheckedExprKind, CheckedFunction, CheckedProgram, CheckedStmt, CheckedStmtKind,
};
pub use symtab::{ClassData, FieldInfo, FunctionData, Param, ScopeData, ScopeKind, SymbolData, SymbolKind, SymbolTable};
pub use types::{Type, ValueCategory};
