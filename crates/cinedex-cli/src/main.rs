//! # cinedex CLI
//!
//! Command-line interface for the cinedex movie catalog.
//!
//! This binary provides human-friendly access to `cinedex-core` functionality.
//! Run `cinedex --help` for usage information.

mod cli;
pub mod ui;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
