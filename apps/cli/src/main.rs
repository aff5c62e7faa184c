//! cairn CLI — mountaineering content collection tool.
//!
//! Fetches route, waypoint, and area content from a remote content API
//! and normalizes it into a flat, retrieval-ready corpus.

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
