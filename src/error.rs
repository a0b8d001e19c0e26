//! Error taxonomy for knowledge-base operations
//!
//! Every failure the core can produce falls into one of five categories:
//!
//! - `Validation` - bad input shape; fail fast, no retry
//! - `Conflict` - optimistic-concurrency collision on write; retry the whole add
//! - `NotFound` - referenced path vanished between list and get
//! - `MalformedEntry` - a stored file doesn't decode
//! - `StoreUnavailable` - remote store unreachable after retries
//!
//! During bulk reads (search, list) `NotFound` and `MalformedEntry` are
//! isolated per entry and never abort the whole request.

use thiserror::Error;

/// Typed failure for knowledge-base operations
#[derive(Debug, Error)]
pub enum PkbError {
    /// Bad input shape. The message names the offending field.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The file at `path` changed (or appeared) under us. The caller may
    /// retry the whole add, which re-resolves a fresh path.
    #[error("write conflict at {path}: file changed in the remote store")]
    Conflict { path: String },

    /// Referenced path does not exist in the remote store.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// A stored file could not be decoded as a knowledge-base entry.
    #[error("malformed entry at {path}: {reason}")]
    MalformedEntry { path: String, reason: String },

    /// The remote store could not be reached, even after retries.
    #[error("remote store unavailable: {reason}")]
    StoreUnavailable { reason: String },
}

impl PkbError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            reason: reason.into(),
        }
    }

    /// Whether this error should skip a single entry during search/list
    /// instead of failing the whole operation.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            PkbError::NotFound { .. } | PkbError::MalformedEntry { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PkbError>;
