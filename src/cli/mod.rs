//! Command-line interface for nzb-cleaner.
//!
//! Argument parsing, flag validation, the interactive destination-directory
//! prompt, and the batch run entry point.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli};
