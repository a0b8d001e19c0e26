//! pkb CLI - Entry point
//!
//! Usage: pkb <command> [options]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pkb::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Add(args) => pkb::cli::add::run(args).await,
        Commands::Search(args) => pkb::cli::search::run(args).await,
        Commands::List(args) => pkb::cli::list::run(args).await,
        Commands::Serve(args) => pkb::cli::serve::run(args).await,
    }
}
