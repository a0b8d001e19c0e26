//! MCP (Model Context Protocol) Server
//!
//! Exposes the knowledge base via MCP tools for AI integration.
//!
//! # Tools
//! - `add_til` - Create a "Today I Learned" entry
//! - `add_prompt` - Save a reusable prompt
//! - `add_pattern` - Document a reusable pattern
//! - `search_pkb` - Keyword search across the repository
//! - `list_entries` - Browse a section

mod server;
mod tools;

pub use server::run_mcp_server;
