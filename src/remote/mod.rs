//! Remote store - the versioned backing file tree
//!
//! The knowledge base owns no durable state of its own; every entry lives as
//! a Markdown file in a remote GitHub repository, addressed by path and
//! versioned by blob sha.

pub mod client;
pub mod store;
pub mod types;

pub use client::GithubStore;
pub use store::{MemoryStore, RemoteStore, StoredFile};
