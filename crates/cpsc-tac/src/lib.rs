//! Three-address code generator and textual TAC format for Compiscript
//! (spec.md §4.4): storage assignment, control-flow and short-circuit
//! lowering, and a writer/parser pair for the wire format the MIPS
//! backend reads.

mod generator;
mod instr;
mod operand;
mod program;
mod storage;
mod text;

pub use generator::generate;
pub use instr::{BinOp, Instr, UnOp};
pub use operand::Operand;
pub use program::TacProgram;
pub use text::{TacParseError, parse_tac};
