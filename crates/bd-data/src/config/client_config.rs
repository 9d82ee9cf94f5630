//! Client configuration for talking to the breakdown API

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Serialize, Deserialize};

use crate::model::ViewKind;

/// Environment variable overriding [`ClientConfig::api_url`]
pub const API_URL_ENV: &str = "BREAKDOWN_API_URL";

/// Environment variable overriding [`ClientConfig::page_size`]
pub const PAGE_SIZE_ENV: &str = "BREAKDOWN_PAGE_SIZE";

/// Configuration shared by the data sources and the coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the API
    pub api_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Rows per explorer page
    pub page_size: usize,

    /// View activated after every new selection
    pub default_view: ViewKind,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 30,
            page_size: 10,
            default_view: ViewKind::Insights,
        }
    }
}

impl ClientConfig {
    /// Load configuration from an optional JSON file, then apply environment
    /// overrides
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {:?}", path))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse config file {:?}", path))?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV) {
            self.api_url = url;
        }

        if let Some(size) = lookup(PAGE_SIZE_ENV) {
            self.page_size = size
                .trim()
                .parse()
                .with_context(|| format!("{} must be a positive integer, got '{}'", PAGE_SIZE_ENV, size))?;
        }

        Ok(())
    }

    /// Reject configurations the coordinator cannot work with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.page_size == 0 {
            bail!("page size must be greater than zero");
        }
        if self.api_url.trim().is_empty() {
            bail!("API URL must not be empty");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}
