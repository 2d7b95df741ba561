//! controlkb CLI for a knowledge base of security control modules.
//!
//! Analyzes control modules into a JSON knowledge base and serves controls,
//! request results and combined context bundles from it.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
