//! CLI module for svcspec.
//!
//! This module provides the command-line interface that collects service
//! flags and prints the compiled specification.

mod commands;
mod output;

pub use commands::{Cli, Commands, CreateArgs, OutputFormat};
pub use output::OutputFormatter;
