//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the peroot binary.

mod backends;
mod commands;
mod generate;

pub use backends::list_backends;
pub use commands::{Cli, Commands};
pub use generate::{GenerateArgs, generate};
