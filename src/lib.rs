//! pkb - GitHub-backed personal knowledge base
//!
//! Stores short notes (TILs), reusable prompts and patterns as Markdown
//! files in a remote versioned repository, and answers keyword search and
//! listing queries over that store.
//!
//! ## Key Concepts
//!
//! - **Sections**: `til/` bucketed by date, `ai/prompts/` and `patterns/`
//!   bucketed by category
//! - **No local state**: every operation re-reads the remote tree; the
//!   stored files are the sole durable representation
//! - **Optimistic concurrency**: writes are create-only or conditional on a
//!   version token; concurrent modification surfaces as `Conflict`, never
//!   silent data loss

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod mcp;
pub mod remote;

pub use crate::core::{Entry, NewEntry, Pkb, Section};
pub use crate::error::PkbError;
pub use crate::mcp::run_mcp_server;
pub use crate::remote::{GithubStore, MemoryStore, RemoteStore, StoredFile};
