use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ReelboxError;
use crate::models::{Category, ContentKind};

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub browse: BrowseConfig,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the catalog server. Empty means not configured yet.
    pub api_base_url: String,
    /// Session cookie for servers that require an account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_cookie: Option<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_entries: usize,
    pub max_items_per_entry: usize,
}

impl CacheConfig {
    /// Entry lifetime. Values past what `chrono` can represent saturate.
    pub fn ttl(&self) -> chrono::Duration {
        i64::try_from(self.ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_entries: 10,
            max_items_per_entry: 40,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseConfig {
    pub page_size: u32,
    /// Categories that always go to the network and are never cached.
    #[serde(default)]
    pub fresh_tags: Vec<FreshTag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshTag {
    pub kind: ContentKind,
    pub tag: String,
}

impl BrowseConfig {
    /// Whether a category must bypass the cache.
    pub fn is_always_fresh(&self, category: &Category) -> bool {
        if category.is_record() {
            return true;
        }
        match (category.kind, category.tag.as_deref()) {
            (Some(kind), Some(tag)) => self
                .fresh_tags
                .iter()
                .any(|f| f.kind == kind && f.tag == tag),
            _ => false,
        }
    }
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            fresh_tags: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load config: user file (if exists), otherwise built-in defaults.
    pub fn load() -> Result<Self, ReelboxError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            Self::load_from(&user_path)
        } else {
            Self::defaults()
        }
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ReelboxError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ReelboxError::Config(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ReelboxError::Config(e.to_string()))
    }

    fn defaults() -> Result<Self, ReelboxError> {
        toml::from_str(DEFAULT_CONFIG).map_err(|e| ReelboxError::Config(e.to_string()))
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), ReelboxError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ReelboxError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ReelboxError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Path to the play-history database.
    pub fn db_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().join("reelbox.db"))
            .unwrap_or_else(|| PathBuf::from("reelbox.db"))
    }

    /// Ensure the data directory exists and return the DB path.
    pub fn ensure_db_path() -> Result<PathBuf, ReelboxError> {
        let path = Self::db_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "reelbox")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::defaults().expect("built-in default config is valid TOML")
    }
}
