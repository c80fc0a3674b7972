// Strata - adaptive query router
// Main entry point

use anyhow::Result;
use clap::Parser;

use strata::cli::{self, Cli, Command};
use strata::config::load_config;
use strata::pipeline::QueryPipeline;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("strata=info")),
        )
        .init();

    let args = Cli::parse();
    let config = load_config()?;
    let pipeline = QueryPipeline::from_config(&config)?;

    match args.command {
        Some(Command::Query { text }) => {
            let query = text.join(" ");
            let response = pipeline.respond(&query).await;
            cli::print_response(&response);
        }
        Some(Command::Repl) | None => cli::run_repl(pipeline).await?,
    }

    Ok(())
}
