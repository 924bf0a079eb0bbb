use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_TUSHARE_URL: &str = "http://api.tushare.pro";
pub const DEFAULT_EASTMONEY_URL: &str = "https://push2.eastmoney.com";

/// Provider credentials and resolver settings loaded from the environment at startup.
///
/// Passed explicitly to the provider clients, the pool cache and the resolver.
#[derive(Debug, Clone)]
pub struct Config {
    // Providers
    pub tushare_token: String,
    pub tushare_url: String,
    pub eastmoney_url: String,

    // Pool resolution
    pub cache_dir: PathBuf,
    pub universe_path: PathBuf,
    pub provider_timeout: Duration,
    pub lookup_concurrency: usize,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. A missing or malformed required variable is a config error.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let provider_timeout_secs = parse_env("PROVIDER_TIMEOUT_SECS", 15u64)?;
        let lookup_concurrency = parse_env("LOOKUP_CONCURRENCY", 4usize)?;
        if lookup_concurrency == 0 {
            return Err(Error::Config("LOOKUP_CONCURRENCY must be at least 1".into()));
        }

        Ok(Config {
            tushare_token: required_env("TUSHARE_TOKEN")?,
            tushare_url: optional_env("TUSHARE_API_URL")
                .unwrap_or_else(|| DEFAULT_TUSHARE_URL.to_string()),
            eastmoney_url: optional_env("EASTMONEY_API_URL")
                .unwrap_or_else(|| DEFAULT_EASTMONEY_URL.to_string()),
            cache_dir: optional_env("POOL_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("cache")),
            universe_path: optional_env("UNIVERSE_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("zpool.json")),
            provider_timeout: Duration::from_secs(provider_timeout_secs),
            lookup_concurrency,
        })
    }
}

fn required_env(key: &str) -> Result<String> {
    match optional_env(key) {
        Some(v) => Ok(v),
        None => Err(Error::Config(format!(
            "Required environment variable '{key}' is not set. Check your .env file."
        ))),
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{key} has an invalid value: '{raw}'"))),
        None => Ok(default),
    }
}
