//! CLI module for sturgeon
//!
//! Provides command-line interface for:
//! - serve: build the schema and answer GraphQL over HTTP
//! - schema: build the schema and print it as SDL

mod args;
mod commands;
mod config;
mod errors;

pub use args::{Cli, Command};
pub use commands::{run, run_command, schema, serve};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
