//! Configuration file (~/.gareport/config.json)

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::types::{ReportError, Result};

/// Environment variable consulted when the config has no access token
pub const ACCESS_TOKEN_ENV: &str = "GA_ACCESS_TOKEN";

const DEFAULT_API_BASE_URL: &str = "https://analyticsdata.googleapis.com";
const DEFAULT_CHANNEL_DIMENSION: &str = "sessionDefaultChannelGroup";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Analytics property to report on
    pub property_id: Option<String>,
    pub api_base_url: String,
    /// OAuth bearer token; falls back to `GA_ACCESS_TOKEN`
    pub access_token: Option<String>,
    pub output_dir: PathBuf,
    pub request_timeout_secs: u64,
    /// Channel grouping dimension, e.g. a custom `sessionCustomChannelGroup:<id>`
    pub channel_dimension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            property_id: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            access_token: None,
            output_dir: PathBuf::from("reports"),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            channel_dimension: DEFAULT_CHANNEL_DIMENSION.to_string(),
        }
    }
}

impl Config {
    /// Load from the default location; a missing file yields defaults
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path; the file must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| ReportError::Config(format!("{}: {}", path.display(), e)))
    }

    /// ~/.gareport/config.json
    pub fn default_path() -> Result<PathBuf> {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| ReportError::Config("Cannot determine home directory".into()))?;
        Ok(base_dirs.home_dir().join(".gareport").join("config.json"))
    }

    pub fn access_token(&self) -> Option<String> {
        self.resolve_access_token(env::var(ACCESS_TOKEN_ENV).ok())
    }

    /// Configured token first, then `env_token`; empty strings count as unset
    pub fn resolve_access_token(&self, env_token: Option<String>) -> Option<String> {
        self.access_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| env_token.filter(|t| !t.is_empty()))
    }

    pub fn property_id(&self) -> Result<&str> {
        self.property_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ReportError::Config("property_id is not set (use --property)".into()))
    }
}
