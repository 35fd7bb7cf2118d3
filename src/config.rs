use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Environment variable that overrides `api.url`.
pub const API_URL_ENV: &str = "WELLPULSE_API_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the backend, e.g. "http://localhost:8080/api"
  pub url: Option<String>,
  /// Per-request deadline in milliseconds
  #[serde(default = "default_timeout_ms")]
  pub timeout_ms: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: None,
      timeout_ms: default_timeout_ms(),
    }
  }
}

impl ApiConfig {
  pub fn url(&self) -> Result<&str> {
    self.url.as_deref().filter(|u| !u.trim().is_empty()).ok_or_else(|| {
      eyre!(
        "API base URL not configured. Set api.url in the config file, \
         the {} environment variable, or pass --api-url.",
        API_URL_ENV
      )
    })
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_millis(self.timeout_ms)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Seconds a cached list stays fresh
  #[serde(default = "default_ttl_secs")]
  pub ttl_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      ttl_secs: default_ttl_secs(),
    }
  }
}

impl CacheConfig {
  pub fn ttl(&self) -> Duration {
    Duration::from_secs(self.ttl_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
  /// Automatic retries after the first failed load
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  #[serde(default = "default_delay_secs")]
  pub delay_secs: u64,
  /// Upper bound of random extra delay added to each retry
  #[serde(default)]
  pub jitter_ms: u64,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      max_retries: default_max_retries(),
      delay_secs: default_delay_secs(),
      jitter_ms: 0,
    }
  }
}

impl RetryConfig {
  pub fn policy(&self) -> RetryPolicy {
    let policy = RetryPolicy::new(self.max_retries, Duration::from_secs(self.delay_secs));
    if self.jitter_ms > 0 {
      policy.with_jitter(Duration::from_millis(self.jitter_ms))
    } else {
      policy
    }
  }
}

fn default_timeout_ms() -> u64 {
  10_000
}

fn default_ttl_secs() -> u64 {
  30
}

fn default_max_retries() -> u32 {
  3
}

fn default_delay_secs() -> u64 {
  5
}

fn default_true() -> bool {
  true
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./wellpulse.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/wellpulse/config.yaml
  ///
  /// Without a file the defaults apply. The base URL can then come from
  /// the environment or the command line.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    Ok(config.with_api_url(std::env::var(API_URL_ENV).ok()))
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("wellpulse.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("wellpulse").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Override the base URL when `url` is set.
  pub fn with_api_url(mut self, url: Option<String>) -> Self {
    if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
      self.api.url = Some(url);
    }
    self
  }
}
