//! Remote API types
//!
//! DTOs for the GitHub REST v3 contents and git/trees endpoints.

use serde::{Deserialize, Serialize};

// ============== Contents ==============

/// File metadata + content from `GET /repos/{repo}/contents/{path}`
#[derive(Debug, Clone, Deserialize)]
pub struct ContentsResponse {
    pub sha: String,
    /// Base64-encoded, possibly with embedded newlines
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

/// Request body for `PUT /repos/{repo}/contents/{path}`
#[derive(Debug, Clone, Serialize)]
pub struct PutContentsRequest {
    pub message: String,
    /// Base64-encoded file body
    pub content: String,
    pub branch: String,
    /// Current blob sha; required when updating, omitted when creating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// Response body for a successful contents PUT
#[derive(Debug, Clone, Deserialize)]
pub struct PutContentsResponse {
    pub content: PutContentsFile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PutContentsFile {
    pub path: String,
    pub sha: String,
}

// ============== Trees ==============

/// Response from `GET /repos/{repo}/git/trees/{ref}?recursive=1`
#[derive(Debug, Clone, Deserialize)]
pub struct TreeResponse {
    pub tree: Vec<TreeNode>,
    /// Set when the repo is too large for one page; callers should treat
    /// the listing as incomplete.
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeNode {
    pub path: String,
    /// "blob" for files, "tree" for directories
    #[serde(rename = "type")]
    pub node_type: String,
}

// ============== Errors ==============

/// Error body the API attaches to non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub message: String,
}
