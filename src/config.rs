use crate::error::ConfigError;
use crate::scrapers::browser::BrowserSettings;
use crate::scrapers::fetch::RetryPolicy;
use crate::scrapers::types::SearchFilter;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything a run needs, built once at start and passed by reference
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub filter: SearchFilter,
    pub runtime: RuntimeOptions,
    pub retry: RetryPolicy,
    pub browser: BrowserSettings,
}

/// Crawl, delivery and scheduling switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeOptions {
    pub fetch_recommended: bool,
    pub fetch_normal: bool,
    /// Hard cap on result pages per search URL
    pub max_pages: u32,
    /// Pause between result pages, in milliseconds
    pub page_delay_ms: u64,
    /// Log messages instead of sending them
    pub dry_run: bool,
    /// Transport limit for one message, in characters
    pub max_chunk_chars: usize,
    pub ledger_path: PathBuf,
    /// Random pause before each scheduled run
    pub random_delay: bool,
    pub max_jitter_secs: u64,
    pub interval_hours: u64,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            fetch_recommended: true,
            fetch_normal: true,
            max_pages: 5,
            page_delay_ms: 1000,
            dry_run: false,
            max_chunk_chars: 4000,
            ledger_path: PathBuf::from("pushed_ids.json"),
            random_delay: true,
            max_jitter_secs: 1800,
            interval_hours: 12,
        }
    }
}

impl RuntimeOptions {
    /// Pause between watched runs, saturating on absurd hour counts
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours.saturating_mul(3600))
    }
}

impl Config {
    /// Load from a TOML file, or use defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                Self::from_toml(&raw)
                    .with_context(|| format!("Invalid config file {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.filter.validate()?;
        if self.runtime.max_pages == 0 {
            return Err(ConfigError::Zero("runtime.max_pages"));
        }
        if self.runtime.max_chunk_chars == 0 {
            return Err(ConfigError::Zero("runtime.max_chunk_chars"));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Zero("retry.max_attempts"));
        }
        if self.runtime.interval_hours == 0 {
            return Err(ConfigError::Zero("runtime.interval_hours"));
        }
        Ok(())
    }
}

/// LINE Messaging API credentials, read from the environment only
#[derive(Debug, Clone, Default)]
pub struct LineCredentials {
    pub access_token: Option<String>,
    pub group_id: Option<String>,
    pub user_id: Option<String>,
}

impl LineCredentials {
    pub fn from_env() -> Self {
        Self {
            access_token: non_empty_var("LINE_CHANNEL_ACCESS_TOKEN"),
            group_id: non_empty_var("LINE_TO_GROUP_ID"),
            user_id: non_empty_var("LINE_TO_USER_ID"),
        }
    }

    /// Group takes precedence over user
    pub fn recipient(&self) -> Option<&str> {
        self.group_id.as_deref().or(self.user_id.as_deref())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
