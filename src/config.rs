//! Environment configuration

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::{IdentityResolver, Passthrough, UserDirectory};
use crate::error::TrackerError;
use crate::scraper::{ScraperConfig, SelectorTable};
use crate::store::{LinkBackend, StorageConfig};

/// Service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageConfig,
    pub scraper: ScraperConfig,
    /// TOML selector table overriding the built-in one
    pub selectors_path: Option<PathBuf>,
    /// JSON `{user_id: display_name}` used to resolve leaderboard names
    pub user_directory: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            storage: StorageConfig::default(),
            scraper: ScraperConfig::default(),
            selectors_path: None,
            user_directory: None,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, TrackerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TrackerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let link_backend = match get("LINK_BACKEND") {
            Some(value) => value.parse::<LinkBackend>().map_err(TrackerError::Config)?,
            None => LinkBackend::Auto,
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", get("PORT"), defaults.port)?,
            storage: StorageConfig {
                data_dir: get("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.data_dir),
                link_backend,
            },
            scraper: ScraperConfig {
                tracker_host: get("TRACKER_HOST").unwrap_or(defaults.scraper.tracker_host),
                timeout_secs: parse_or(
                    "RENDER_TIMEOUT_SECS",
                    get("RENDER_TIMEOUT_SECS"),
                    defaults.scraper.timeout_secs,
                )?,
                max_concurrent: parse_or(
                    "MAX_CONCURRENT_EXTRACTIONS",
                    get("MAX_CONCURRENT_EXTRACTIONS"),
                    defaults.scraper.max_concurrent,
                )?,
                chrome_path: get("CHROME_PATH").map(PathBuf::from),
                ..defaults.scraper
            },
            selectors_path: get("SELECTORS_PATH").map(PathBuf::from),
            user_directory: get("USER_DIRECTORY").map(PathBuf::from),
        })
    }

    /// Bind address for the API server
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Selector table from `selectors_path`, or the built-in one
    pub fn selector_table(&self) -> Result<SelectorTable, TrackerError> {
        match &self.selectors_path {
            Some(path) => {
                tracing::info!("Loading selector table from {:?}", path);
                Ok(SelectorTable::load(path)?)
            }
            None => Ok(SelectorTable::default()),
        }
    }

    /// Identity resolver from `user_directory`, or [`Passthrough`]
    pub fn identity_resolver(&self) -> Result<Arc<dyn IdentityResolver>, TrackerError> {
        let Some(path) = &self.user_directory else {
            return Ok(Arc::new(Passthrough));
        };

        let content = std::fs::read_to_string(path)
            .map_err(|e| TrackerError::Config(format!("cannot read {:?}: {}", path, e)))?;
        let directory: UserDirectory = serde_json::from_str(&content)
            .map_err(|e| TrackerError::Config(format!("invalid user directory {:?}: {}", path, e)))?;

        tracing::info!("Loaded {} display names from {:?}", directory.len(), path);
        Ok(Arc::new(directory))
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T, TrackerError>
where
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| TrackerError::Config(format!("{}={}: {}", key, raw, e))),
        None => Ok(default),
    }
}
