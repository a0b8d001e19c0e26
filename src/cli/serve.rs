//! `pkb serve` command
//!
//! Runs the MCP server over stdio so AI clients can call the five
//! knowledge-base tools.

use anyhow::Result;
use clap::Args;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Transport to use (only stdio is supported)
    #[arg(short, long, default_value = "stdio")]
    pub transport: String,
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let config = Config::load()?;

    match args.transport.as_str() {
        "stdio" => crate::mcp::run_mcp_server(&config).await,
        other => {
            anyhow::bail!("Unknown transport: {}. Use 'stdio'.", other);
        }
    }
}
