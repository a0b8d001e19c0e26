//! Configuration module
//!
//! The target repository and write credential are process-startup inputs:
//! a TOML file (`.pkb/config.toml` found walking up from the working
//! directory, then `~/.pkb/config.toml`) with environment-variable
//! overrides for the repo and token.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
}

/// Backing-store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Target repository ("owner/name")
    #[serde(default)]
    pub repo: Option<String>,

    /// Branch to read and write
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Write credential (usually set via GITHUB_TOKEN instead)
    #[serde(default)]
    pub token: Option<String>,

    /// API base URL (override for GitHub Enterprise)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bounded retries for transient store failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            repo: None,
            branch: default_branch(),
            token: None,
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Config {
    /// Load config from default locations, then apply env overrides
    pub fn load() -> Result<Self> {
        let mut config = if let Some(local) = Self::find_local_config() {
            Self::load_from(&local)?
        } else if let Some(global) = Self::global_config_path().filter(|p| p.exists()) {
            Self::load_from(&global)?
        } else {
            Self::default()
        };

        config.apply_env();
        Ok(config)
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Environment wins over file values
    fn apply_env(&mut self) {
        for var in ["PKB_REPO", "GITHUB_REPO"] {
            if let Ok(repo) = std::env::var(var) {
                if !repo.is_empty() {
                    self.store.repo = Some(repo);
                    break;
                }
            }
        }
        for var in ["PKB_GITHUB_TOKEN", "GITHUB_TOKEN"] {
            if let Ok(token) = std::env::var(var) {
                if !token.is_empty() {
                    self.store.token = Some(token);
                    break;
                }
            }
        }
    }

    /// Find local .pkb/config.toml walking up directories
    pub fn find_local_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let config_path = current.join(".pkb").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Get global config path (~/.pkb/config.toml)
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".pkb").join("config.toml"))
    }
}

/// Helper to get directories crate functionality
mod dirs {
    use std::path::PathBuf;

    pub fn home_dir() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE").ok().map(PathBuf::from)
        }
        #[cfg(not(windows))]
        {
            std::env::var("HOME").ok().map(PathBuf::from)
        }
    }
}
