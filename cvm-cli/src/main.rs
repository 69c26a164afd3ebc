//! CVM CLI: translate a program file to native code and run it.
//!
//! Exit codes:
//! - 0: Program reached HALT
//! - 1: Usage, input or program-text error
//! - 2: Translation error (illegal opcode, bad target, code too large)
//! - 3: Memory mapping or protection failure, or a host that cannot run
//!   native code
//!
//! A trap inside the generated code (such as division by zero) ends the
//! process with the host's signal instead of an exit code.

mod commands;
mod logger;

use std::process;

fn main() {
    logger::configure();

    let args: Vec<String> = std::env::args().collect();

    if args.len() != 2 {
        print_usage();
        process::exit(1);
    }

    if matches!(args[1].as_str(), "--help" | "-h") {
        print_usage();
        process::exit(0);
    }

    if let Err(code) = commands::run(&args[1]) {
        process::exit(code);
    }
}

fn print_usage() {
    eprintln!("Usage: cvm <program>");
    eprintln!();
    eprintln!("Reads a CVM program (word count, then one word per line),");
    eprintln!("translates it to native code and runs it until HALT.");
    eprintln!();
    eprintln!("Set RUST_LOG=debug to trace translation on stderr.");
}
