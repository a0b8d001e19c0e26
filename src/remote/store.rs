//! Remote store capability
//!
//! Thin contract over the versioned backing file store: read a file, write a
//! file (optionally conditional on its current version token), list the tree.
//! The GitHub-backed implementation lives in `client.rs`; `MemoryStore` here
//! backs the test suite.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{PkbError, Result};

/// A file as stored in the remote tree
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: String,
    pub content: String,
    /// Opaque content-version token (blob sha for GitHub). Required for
    /// conditional updates.
    pub version: String,
}

/// Capability-style contract over the backing versioned file store
///
/// Each `put` is one atomic revision; no partial writes are ever visible.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch a file's content and version token
    async fn get(&self, path: &str) -> Result<StoredFile>;

    /// Write a file, returning the new version token
    ///
    /// With `expected_version = None` this is create-only: it fails with
    /// `Conflict` if the path already exists. With `Some(token)` it is a
    /// conditional update: `Conflict` if the store's current token differs,
    /// `NotFound` if the path no longer exists.
    async fn put(
        &self,
        path: &str,
        content: &str,
        message: &str,
        expected_version: Option<&str>,
    ) -> Result<String>;

    /// List all file paths under a prefix (nested paths included)
    ///
    /// The store does not guarantee ordering; callers must treat the
    /// sequence as unordered.
    async fn list_tree(&self, prefix: &str) -> Result<Vec<String>>;
}

/// In-memory store with monotonic revision tokens
///
/// Implements the same optimistic-concurrency contract as the real backend
/// so service tests exercise conflict paths without a network.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    files: HashMap<String, (String, String)>, // path -> (content, version)
    revision: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>> {
        self.inner
            .lock()
            .map_err(|e| PkbError::unavailable(format!("store lock poisoned: {}", e)))
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<StoredFile> {
        let inner = self.lock()?;
        match inner.files.get(path) {
            Some((content, version)) => Ok(StoredFile {
                path: path.to_string(),
                content: content.clone(),
                version: version.clone(),
            }),
            None => Err(PkbError::NotFound {
                path: path.to_string(),
            }),
        }
    }

    async fn put(
        &self,
        path: &str,
        content: &str,
        _message: &str,
        expected_version: Option<&str>,
    ) -> Result<String> {
        let mut inner = self.lock()?;

        match (expected_version, inner.files.get(path)) {
            // Create-only write against an existing path
            (None, Some(_)) => {
                return Err(PkbError::Conflict {
                    path: path.to_string(),
                })
            }
            // Conditional update against a vanished path
            (Some(_), None) => {
                return Err(PkbError::NotFound {
                    path: path.to_string(),
                })
            }
            // Stale token never overwrites the newer revision
            (Some(expected), Some((_, current))) if expected != current => {
                return Err(PkbError::Conflict {
                    path: path.to_string(),
                })
            }
            _ => {}
        }

        inner.revision += 1;
        let version = format!("rev-{}", inner.revision);
        inner
            .files
            .insert(path.to_string(), (content.to_string(), version.clone()));
        Ok(version)
    }

    async fn list_tree(&self, prefix: &str) -> Result<Vec<String>> {
        let inner = self.lock()?;
        Ok(inner
            .files
            .keys()
            .filter(|p| p.starts_with(prefix))
            .cloned()
            .collect())
    }
}
