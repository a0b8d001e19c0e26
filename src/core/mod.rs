//! Core - entry model, codec, path scheme and the knowledge-base service

pub mod codec;
pub mod entry;
pub mod path;
pub mod service;

pub use entry::{AddOutcome, Entry, EntrySummary, SearchResult, Section};
pub use service::{ListOutcome, NewEntry, Pkb, SearchOutcome};
