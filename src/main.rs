//! GhostNodes CLI entry point
//!
//! Parses arguments and runs one command via `cli::run`; on failure the
//! error is printed to stderr and the process exits non-zero.

use ghostnodes::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
