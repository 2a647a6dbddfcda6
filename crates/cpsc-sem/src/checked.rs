//! The annotated AST that the semantic analyzer produces (spec.md §2, §9
//! design note: "each AST reference should carry its resolved SymbolId, so
//! TAC generation is a pure lowering that does not re-resolve names").
//! Separate node types rather than mutating the parser's AST in place keeps
//! `cpsc-syntax` a pure, analysis-free parser.

use cpsc_util::{ClassId, FunctionId, Span, Symbol, SymbolId};

use crate::types::{Type, ValueCategory};
pub use cpsc_syntax::ast::{BinaryOp, LogicalOp, UnaryOp};

#[derive(Debug, Clone, Default)]
pub struct CheckedProgram {
    pub functions: Vec<CheckedFunction>,
    pub classes: Vec<CheckedClass>,
    /// Every top-level statement in source order, excluding hoisted
    /// function/class declarations — wrapped into a synthetic `main` by
    /// the TAC generator (spec.md §4.4).
    pub main_body: Vec<CheckedStmt>,
}

#[derive(Debug, Clone)]
pub struct CheckedFunction {
    pub id: FunctionId,
    pub params: Vec<SymbolId>,
    pub body: Vec<CheckedStmt>,
}

#[derive(Debug, Clone)]
pub struct CheckedClass {
    pub id: ClassId,
    pub constructor: Option<CheckedFunction>,
    pub methods: Vec<CheckedFunction>,
}

#[derive(Debug, Clone)]
pub struct CheckedStmt {
    pub kind: CheckedStmtKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum CheckedStmtKind {
    VarDecl {
        symbol: SymbolId,
        init: Option<CheckedExpr>,
    },
    ExprStmt(CheckedExpr),
    Block(Vec<CheckedStmt>),
    If {
        cond: CheckedExpr,
        then_branch: Box<CheckedStmt>,
        else_branch: Option<Box<CheckedStmt>>,
    },
    While {
        cond: CheckedExpr,
        body: Box<CheckedStmt>,
    },
    DoWhile {
        body: Box<CheckedStmt>,
        cond: CheckedExpr,
    },
    For {
        init: Option<Box<CheckedStmt>>,
        cond: Option<CheckedExpr>,
        step: Option<CheckedExpr>,
        body: Box<CheckedStmt>,
    },
    Foreach {
        var: SymbolId,
        iter: CheckedExpr,
        body: Box<CheckedStmt>,
    },
    Switch {
        subject: CheckedExpr,
        cases: Vec<(CheckedExpr, Vec<CheckedStmt>)>,
        default: Option<Vec<CheckedStmt>>,
    },
    Break,
    Continue,
    Return(Option<CheckedExpr>),
    Try {
        body: Box<CheckedStmt>,
        catch_symbol: SymbolId,
        catch_body: Box<CheckedStmt>,
    },
    Print(CheckedExpr),
    /// A statement that failed to check; skipped by the TAC generator
    /// (which only ever runs when diagnostics are empty).
    Error,
}

#[derive(Debug, Clone)]
pub struct CheckedExpr {
    pub kind: CheckedExprKind,
    pub ty: Type,
    pub category: ValueCategory,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum CheckedExprKind {
    IntLiteral(i64),
    StringLiteral(Symbol),
    BoolLiteral(bool),
    NullLiteral,
    ArrayLiteral(Vec<CheckedExpr>),
    Local(SymbolId),
    This,
    Unary {
        op: UnaryOp,
        operand: Box<CheckedExpr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<CheckedExpr>,
        rhs: Box<CheckedExpr>,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<CheckedExpr>,
        rhs: Box<CheckedExpr>,
    },
    Assign {
        target: Box<CheckedExpr>,
        value: Box<CheckedExpr>,
    },
    Ternary {
        cond: Box<CheckedExpr>,
        then_branch: Box<CheckedExpr>,
        else_branch: Box<CheckedExpr>,
    },
    Index {
        base: Box<CheckedExpr>,
        index: Box<CheckedExpr>,
    },
    Field {
        base: Box<CheckedExpr>,
        owner: ClassId,
        field: SymbolId,
        offset: u32,
    },
    MethodCall {
        base: Box<CheckedExpr>,
        method: FunctionId,
        args: Vec<CheckedExpr>,
    },
    SuperCall {
        method: FunctionId,
        args: Vec<CheckedExpr>,
    },
    Call {
        function: FunctionId,
        args: Vec<CheckedExpr>,
    },
    New {
        class: ClassId,
        constructor: Option<FunctionId>,
        args: Vec<CheckedExpr>,
    },
    /// A sub-expression that failed to typecheck; carries `Type::Unknown`.
    Error,
}
