mod cli;

use std::io::Write as _;
use std::path::Path;

use clap::Parser;

use cli::Cli;
use cpsc_util::{Diagnostics, DiagnosticsPrinter};

fn main() {
    let args = Cli::parse();
    std::process::exit(run(&args));
}

fn run(args: &Cli) -> i32 {
    let path = &args.file;
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[ERROR]");
            eprintln!("- cannot read '{}': {e}", path.display());
            return 2;
        }
    };

    let parsed = cpsc_syntax::parse(&source);
    if !parsed.diagnostics.is_empty() {
        report(&parsed.diagnostics, &source, args.color.should_colorize());
        return 2;
    }

    let mut interner = parsed.interner;
    let (checked, table, diagnostics) = cpsc_sem::analyze(&parsed.program, &mut interner);
    if !diagnostics.is_empty() {
        report(&diagnostics, &source, args.color.should_colorize());
        return 1;
    }

    if args.dump_symbols {
        eprint!("{}", table.dump(|sym| interner.resolve(sym).to_owned()));
    }

    let tac = cpsc_tac::generate(&checked, &table, &interner);

    if args.dump_tac {
        print!("{}", tac.to_text());
        println!("[OK]");
        return 0;
    }

    if let Some(out) = &args.mips {
        let asm = cpsc_mips::generate(&tac);
        if out == "-" {
            print!("{asm}");
        } else {
            let out_path = if out.is_empty() { default_asm_path(path) } else { Path::new(out).to_path_buf() };
            if let Err(e) = std::fs::write(&out_path, &asm) {
                eprintln!("[ERROR]");
                eprintln!("- cannot write '{}': {e}", out_path.display());
                return 2;
            }
        }
    }

    println!("[OK]");
    0
}

fn default_asm_path(source_path: &Path) -> std::path::PathBuf {
    source_path.with_extension("asm")
}

fn report(diagnostics: &Diagnostics, source: &str, colored: bool) {
    eprintln!("[ERROR]");
    if colored {
        let printer = DiagnosticsPrinter::new(diagnostics).source(source).colored(true);
        eprint!("{}", printer.render());
    } else {
        let printer = DiagnosticsPrinter::new(diagnostics);
        for line in printer.render_plain(source).lines() {
            eprintln!("- {line}");
        }
    }
    std::io::stderr().flush().ok();
}
