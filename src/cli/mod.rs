//! CLI module - argument parsing and commands

pub mod add;
pub mod list;
pub mod search;
pub mod serve;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pkb")]
#[command(about = "GitHub-backed personal knowledge base (TILs, prompts, patterns)")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add an entry to the knowledge base
    Add(add::AddArgs),
    /// Search the knowledge base by keyword
    Search(search::SearchArgs),
    /// List entries in a section
    List(list::ListArgs),
    /// Run the MCP server (stdio transport)
    Serve(serve::ServeArgs),
}
