//! GitHub-backed remote store
//!
//! Implements `RemoteStore` over the GitHub REST v3 API: the contents
//! endpoint for reads/writes and the git/trees endpoint for listing.
//! Every write is one commit on the configured branch, conditional on the
//! blob sha when a version token is supplied.
//!
//! Transient failures (network errors, 429, 5xx) are retried a bounded
//! number of times with exponential backoff; whatever survives the retries
//! surfaces as `StoreUnavailable`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::config::StoreConfig;
use crate::error::{PkbError, Result};

use super::store::{RemoteStore, StoredFile};
use super::types::*;

const BACKOFF_BASE_MS: u64 = 250;

/// HTTP client for a GitHub-hosted knowledge-base repo
#[derive(Debug, Clone)]
pub struct GithubStore {
    client: Client,
    base_url: Url,
    repo: String,
    branch: String,
    token: Option<String>,
    max_retries: u32,
}

impl GithubStore {
    /// Create a new store from config
    pub fn from_config(config: &StoreConfig) -> anyhow::Result<Self> {
        let repo = config.repo.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "Repository not configured. Set store.repo in config or the PKB_REPO env var."
            )
        })?;

        Self::new(
            &config.api_url,
            repo,
            &config.branch,
            config.token.clone(),
            config.timeout_secs,
            config.max_retries,
        )
    }

    /// Create a new store with explicit parameters
    pub fn new(
        api_url: &str,
        repo: &str,
        branch: &str,
        token: Option<String>,
        timeout_secs: u64,
        max_retries: u32,
    ) -> anyhow::Result<Self> {
        let base_url =
            Url::parse(api_url).with_context(|| format!("Invalid API URL: {}", api_url))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("pkb/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            repo: repo.to_string(),
            branch: branch.to_string(),
            token,
            max_retries,
        })
    }

    /// Build a URL for a contents-API path
    fn contents_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(&format!("repos/{}/contents/{}", self.repo, path))
            .map_err(|e| PkbError::unavailable(format!("invalid path {}: {}", path, e)))
    }

    /// Add auth header if a token is set
    fn auth_header(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header("Accept", "application/vnd.github+json");
        if let Some(ref token) = self.token {
            builder.header("Authorization", format!("Bearer {}", token))
        } else {
            builder
        }
    }

    /// Send a request, retrying transient failures with backoff
    async fn send_with_retry<F>(&self, build: F, what: &str) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            let reason = match self.auth_header(build()).send().await {
                Ok(resp) if !is_transient(resp.status()) => return Ok(resp),
                Ok(resp) => format!("{} returned {}", what, resp.status()),
                Err(e) => format!("{} failed: {}", what, e),
            };

            if attempt >= self.max_retries {
                return Err(PkbError::unavailable(format!(
                    "{} (after {} attempt(s))",
                    reason,
                    attempt + 1
                )));
            }

            let backoff = Duration::from_millis(BACKOFF_BASE_MS << attempt);
            tracing::warn!(what, attempt, ?backoff, "transient store failure, retrying");
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }

    /// Extract the API's error message from a failed response
    async fn extract_error(resp: reqwest::Response) -> String {
        let status = resp.status();
        match resp.json::<ApiErrorResponse>().await {
            Ok(err) => format!("{}: {}", status, err.message),
            Err(_) => status.to_string(),
        }
    }
}

/// Worth retrying: rate limits and server-side failures
fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl RemoteStore for GithubStore {
    async fn get(&self, path: &str) -> Result<StoredFile> {
        let mut url = self.contents_url(path)?;
        url.query_pairs_mut().append_pair("ref", &self.branch);

        let resp = self
            .send_with_retry(|| self.client.get(url.clone()), "get")
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(PkbError::NotFound {
                path: path.to_string(),
            });
        }
        if !resp.status().is_success() {
            return Err(PkbError::unavailable(Self::extract_error(resp).await));
        }

        let body: ContentsResponse = resp
            .json()
            .await
            .map_err(|e| PkbError::unavailable(format!("unparseable contents response: {}", e)))?;

        let encoded = body.content.unwrap_or_default();
        // The API wraps base64 bodies at 60 columns
        let stripped: String = encoded.split_whitespace().collect();
        let raw = BASE64
            .decode(stripped.as_bytes())
            .map_err(|e| PkbError::MalformedEntry {
                path: path.to_string(),
                reason: format!("invalid base64 content: {}", e),
            })?;
        let content = String::from_utf8(raw).map_err(|_| PkbError::MalformedEntry {
            path: path.to_string(),
            reason: "content is not valid UTF-8".to_string(),
        })?;

        Ok(StoredFile {
            path: path.to_string(),
            content,
            version: body.sha,
        })
    }

    async fn put(
        &self,
        path: &str,
        content: &str,
        message: &str,
        expected_version: Option<&str>,
    ) -> Result<String> {
        let url = self.contents_url(path)?;
        let request = PutContentsRequest {
            message: message.to_string(),
            content: BASE64.encode(content.as_bytes()),
            branch: self.branch.clone(),
            sha: expected_version.map(String::from),
        };

        let resp = self
            .send_with_retry(|| self.client.put(url.clone()).json(&request), "put")
            .await?;

        match resp.status() {
            s if s.is_success() => {
                let body: PutContentsResponse = resp.json().await.map_err(|e| {
                    PkbError::unavailable(format!("unparseable put response: {}", e))
                })?;
                Ok(body.content.sha)
            }
            StatusCode::NOT_FOUND => Err(PkbError::NotFound {
                path: path.to_string(),
            }),
            // 409 = branch moved under us; 422 = sha missing or stale.
            // Both mean another writer got there first.
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => Err(PkbError::Conflict {
                path: path.to_string(),
            }),
            _ => Err(PkbError::unavailable(Self::extract_error(resp).await)),
        }
    }

    async fn list_tree(&self, prefix: &str) -> Result<Vec<String>> {
        let url = self
            .base_url
            .join(&format!(
                "repos/{}/git/trees/{}?recursive=1",
                self.repo, self.branch
            ))
            .map_err(|e| PkbError::unavailable(format!("invalid tree URL: {}", e)))?;

        let resp = self
            .send_with_retry(|| self.client.get(url.clone()), "list_tree")
            .await?;

        // Fresh repo or missing branch: nothing stored yet
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !resp.status().is_success() {
            return Err(PkbError::unavailable(Self::extract_error(resp).await));
        }

        let body: TreeResponse = resp
            .json()
            .await
            .map_err(|e| PkbError::unavailable(format!("unparseable tree response: {}", e)))?;

        if body.truncated {
            tracing::warn!(prefix, "tree listing truncated by the API; results incomplete");
        }

        Ok(body
            .tree
            .into_iter()
            .filter(|node| node.node_type == "blob" && node.path.starts_with(prefix))
            .map(|node| node.path)
            .collect())
    }
}
