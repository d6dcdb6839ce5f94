//! CLI argument definitions using clap
//!
//! Commands:
//! - sturgeon serve --config <path>
//! - sturgeon schema --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sturgeon - a GraphQL query interface over document store collections
#[derive(Parser, Debug)]
#[command(name = "sturgeon")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the schema from the store's mappings and serve it over HTTP
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./sturgeon.json")]
        config: PathBuf,
    },

    /// Build the schema and print it as SDL
    Schema {
        /// Path to configuration file
        #[arg(long, default_value = "./sturgeon.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
