/*
 * Responsibility
 * - Environment / .env loading (backend URL, storage location, landing path)
 * - Validation of the values (invalid -> startup fails)
 */
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: AppEnv,
    pub api_base_url: Url,
    pub storage_dir: PathBuf,
    pub storage_poll_interval: Duration,
    pub landing_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (environment, test map, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_env = lookup("APP_ENV")
            .map(|v| AppEnv::parse(&v))
            .unwrap_or(AppEnv::Development);

        let api_base_url = lookup("BEAUTYROOM_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_base_url = Url::parse(api_base_url.trim())
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or(ConfigError::Invalid("BEAUTYROOM_API_URL"))?;

        let storage_dir = lookup("BEAUTYROOM_STORAGE_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".beautyroom"));

        let storage_poll_interval = match lookup("STORAGE_POLL_INTERVAL_MS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .ok_or(ConfigError::Invalid("STORAGE_POLL_INTERVAL_MS"))?,
            None => Duration::from_millis(500),
        };

        let landing_path = lookup("LANDING_PATH").unwrap_or_else(|| "/".to_string());
        if !landing_path.starts_with('/') {
            return Err(ConfigError::Invalid("LANDING_PATH"));
        }

        Ok(Self {
            app_env,
            api_base_url,
            storage_dir,
            storage_poll_interval,
            landing_path,
        })
    }
}
