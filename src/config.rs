//! Service configuration
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. `main` reads a `.env` file first, when one exists.

use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use crate::error::ConfigError;

/// Base URL of the public demo catalog.
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://dummyjson.com";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Address the HTTP server listens on (`SHOP_BIND_ADDR`)
    pub bind_addr: SocketAddr,

    /// Root of the remote catalog API (`CATALOG_BASE_URL`)
    pub catalog_base_url: String,

    /// Per-request timeout for catalog fetches (`CATALOG_TIMEOUT_SECS`)
    pub catalog_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            catalog_base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            catalog_timeout: Duration::from_secs(10),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults for
    /// unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = parse_or(&lookup, "SHOP_BIND_ADDR", defaults.bind_addr)?;
        let catalog_base_url = lookup("CATALOG_BASE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.catalog_base_url);
        let timeout_secs = parse_or(
            &lookup,
            "CATALOG_TIMEOUT_SECS",
            defaults.catalog_timeout.as_secs(),
        )?;

        Ok(Self {
            bind_addr,
            catalog_base_url,
            catalog_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
