//! The TAC instruction stream as a whole, plus its textual rendering
//! (spec.md §6: "one instruction per line... Whitespace between tokens is
//! arbitrary; indentation is conventional, not semantic").

use std::fmt;

use crate::instr::Instr;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TacProgram {
    pub instrs: Vec<Instr>,
}

impl TacProgram {
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TacProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in &self.instrs {
            match instr {
                Instr::Label(_) => writeln!(f, "{instr}")?,
                Instr::FunctionBegin(_) | Instr::FunctionEnd(_) => writeln!(f, "{instr}")?,
                _ => writeln!(f, "    {instr}")?,
            }
        }
        Ok(())
    }
}
