//! The TAC instruction set (spec.md §4.4): one instruction per line, the
//! textual form the MIPS backend reads.

use std::fmt;

use crate::operand::Operand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    pub fn from_token(s: &str) -> Option<BinOp> {
        Some(match s {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "%" => BinOp::Mod,
            "==" => BinOp::Eq,
            "!=" => BinOp::Ne,
            "<" => BinOp::Lt,
            "<=" => BinOp::Le,
            ">" => BinOp::Gt,
            ">=" => BinOp::Ge,
            "&&" => BinOp::And,
            "||" => BinOp::Or,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

impl UnOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
        }
    }

    pub fn from_token(s: &str) -> Option<UnOp> {
        Some(match s {
            "-" => UnOp::Neg,
            "!" => UnOp::Not,
            _ => return None,
        })
    }
}

/// One TAC instruction (spec.md §4.4's instruction set table), plus the
/// memory-access forms `§4.4`'s lowering rules name in prose (`base[off]`,
/// `arr[i]`) as concrete variants rather than nested operands.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// `x := y`
    Copy { dst: Operand, src: Operand },
    /// `x := y op z`
    Binary { dst: Operand, op: BinOp, lhs: Operand, rhs: Operand },
    /// `x := op y`
    Unary { dst: Operand, op: UnOp, src: Operand },
    /// `t := base[idx]` — `base[off]` for a field (idx an integer literal
    /// offset) or `arr[i]` for an index (idx a computed temp); the two
    /// share one textual and instruction form (spec.md §4.4).
    Load { dst: Operand, base: Operand, index: Operand },
    /// `base[idx] := v`
    Store { base: Operand, index: Operand, value: Operand },
    /// `L:`
    Label(String),
    /// `GOTO L`
    Goto(String),
    /// `IF cond > 0 GOTO L`
    IfGoto { cond: Operand, label: String },
    /// `PARAM v`
    Param(Operand),
    /// `CALL f,n`
    Call { name: String, argc: u32 },
    /// `RETURN v?`
    Return(Option<Operand>),
    /// `FUNCTION f:`
    FunctionBegin(String),
    /// `END FUNCTION f`
    FunctionEnd(String),
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Copy { dst, src } => write!(f, "{dst} := {src}"),
            Instr::Binary { dst, op, lhs, rhs } => write!(f, "{dst} := {lhs} {} {rhs}", op.as_str()),
            Instr::Unary { dst, op, src } => write!(f, "{dst} := {}{src}", op.as_str()),
            Instr::Load { dst, base, index } => write!(f, "{dst} := {base}[{index}]"),
            Instr::Store { base, index, value } => write!(f, "{base}[{index}] := {value}"),
            Instr::Label(name) => write!(f, "{name}:"),
            Instr::Goto(label) => write!(f, "GOTO {label}"),
            Instr::IfGoto { cond, label } => write!(f, "IF {cond} > 0 GOTO {label}"),
            Instr::Param(v) => write!(f, "PARAM {v}"),
            Instr::Call { name, argc } => write!(f, "CALL {name},{argc}"),
            Instr::Return(Some(v)) => write!(f, "RETURN {v}"),
            Instr::Return(None) => write!(f, "RETURN"),
            Instr::FunctionBegin(name) => write!(f, "FUNCTION {name}:"),
            Instr::FunctionEnd(name) => write!(f, "END FUNCTION {name}"),
        }
    }
}
