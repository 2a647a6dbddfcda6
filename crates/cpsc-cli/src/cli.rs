//! Argument parsing for the `compiscript` driver (SPEC_FULL.md §9).

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn should_colorize(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

/// Compiles a Compiscript (`.cps`) source file: parse, analyze, and
/// (optionally) lower to TAC and MIPS32 assembly.
#[derive(Parser)]
#[command(name = "compiscript", bin_name = "compiscript")]
pub struct Cli {
    /// Compiscript source file
    pub file: PathBuf,

    /// Emit MIPS32 assembly to <FILE>.asm; pass '-' to write to stdout
    #[arg(long, value_name = "OUT", num_args = 0..=1, default_missing_value = "")]
    pub mips: Option<String>,

    /// Print the symbol table dump to stderr after a successful analysis
    #[arg(long)]
    pub dump_symbols: bool,

    /// Print the TAC textual form to stdout instead of running the MIPS stage
    #[arg(long)]
    pub dump_tac: bool,

    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,
}
