// Command line interface
// Argument parsing plus the interactive REPL

mod repl;

pub use repl::{print_response, run_repl};

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "strata", version, about = "Adaptive query router")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer a single query and exit
    Query {
        /// The query text
        text: Vec<String>,
    },
    /// Interactive session (the default)
    Repl,
}
