//! Configuration for mcpchat.
//!
//! Loads from `$MCPCHAT_CONFIG` or `~/.config/mcpchat/config.toml`; a
//! missing file just means defaults. `MCPCHAT_BASE_URL` overrides the
//! configured base URL (env > config > default).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default base URL of the chat backend's REST API.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/api";

/// Matches the backend's five-minute SSE emitter timeout.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the chat backend (sessions, tools, chat endpoints).
    pub base_url: String,
    /// Optional absolute URL of the user-info endpoint. The original
    /// deployment served it from a separate BFF host, so it is configured
    /// independently of `base_url`.
    pub user_info_url: Option<String>,
    /// Timeout for a single request, including a full streamed response.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_info_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Loads configuration from the default location, applying env
    /// overrides.
    pub fn load() -> Result<Self> {
        let config = match config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.with_env_overrides()
    }

    /// Loads configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Invalid config at {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(base_url) = std::env::var("MCPCHAT_BASE_URL") {
            let trimmed = base_url.trim();
            if !trimmed.is_empty() {
                self.base_url = trimmed.to_string();
            }
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base URL: {}", self.base_url))?;
        if let Some(user_info_url) = &self.user_info_url {
            url::Url::parse(user_info_url)
                .with_context(|| format!("Invalid user-info URL: {user_info_url}"))?;
        }
        Ok(())
    }
}

/// `$MCPCHAT_CONFIG`, else `~/.config/mcpchat/config.toml`.
fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("MCPCHAT_CONFIG") {
        return Some(PathBuf::from(path));
    }
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("mcpchat")
            .join("config.toml")
    })
}
