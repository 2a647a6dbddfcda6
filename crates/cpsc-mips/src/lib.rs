//! MIPS32 backend (SPEC_FULL.md §7): a direct, unoptimized tree-walk
//! over the TAC instruction stream emitting SPIM/MARS-compatible
//! assembly. No register allocation — every temporary, local, and
//! parameter gets a fixed stack slot sized at function entry.

mod emit;
mod layout;

pub use emit::generate;
