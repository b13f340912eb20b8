//! Command-line interface for qa-forge.
//!
//! Provides the question-generation entry point plus the assessment
//! service and migration commands.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli};
