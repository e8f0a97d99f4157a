//! CLI module for the SCN detector.
//!
//! This module provides the command-line interface: argument definitions,
//! report file exchange between the `analyze` and `classify` stages, and
//! terminal output formatting.

mod commands;
mod files;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use files::{read_analysis, write_json};
pub use output::OutputFormatter;
