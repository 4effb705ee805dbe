//! snipreg CLI entry point
//!
//! Parses nothing and opens nothing itself. All logic lives in `cli::run`;
//! this only reports the error and sets the exit code.

use snipreg::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
