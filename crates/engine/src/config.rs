use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub orders_path: String,
    pub drivers_path: String,
    pub trucks_path: String,
    /// When set, snapshots are read from `orders.json`, `drivers.json` and
    /// `trucks.json` in this directory instead of the API.
    pub fixtures_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub refresh_interval_secs: u64,
    pub fetch_timeout_secs: u64,
    #[serde(default)]
    pub reset_acks_on_refresh: bool,
}

impl EngineConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 300,
            fetch_timeout_secs: 10,
            reset_acks_on_refresh: false,
        }
    }
}

impl ApiConfig {
    /// Base URL with a trailing slash so relative paths join under it.
    pub fn base_url(&self) -> crate::Result<Url> {
        let mut base = self.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base)
            .map_err(|e| crate::Error::Config(format!("API_BASE_URL {:?} is invalid: {}", self.base_url, e)))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api/".to_string(),
            token: None,
            orders_path: "orders".to_string(),
            drivers_path: "drivers".to_string(),
            trucks_path: "trucks".to_string(),
            fixtures_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> crate::Result<Self> {
        // Load environment variables from .env file if it exists
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let config = Config {
            server: ServerConfig {
                addr: lookup("SERVER_ADDR").unwrap_or(defaults.server.addr),
            },
            api: ApiConfig {
                base_url: lookup("API_BASE_URL").unwrap_or(defaults.api.base_url),
                token: lookup("API_TOKEN").filter(|t| !t.is_empty()),
                orders_path: lookup("ORDERS_PATH").unwrap_or(defaults.api.orders_path),
                drivers_path: lookup("DRIVERS_PATH").unwrap_or(defaults.api.drivers_path),
                trucks_path: lookup("TRUCKS_PATH").unwrap_or(defaults.api.trucks_path),
                fixtures_dir: lookup("FIXTURES_DIR").filter(|d| !d.is_empty()).map(PathBuf::from),
            },
            engine: EngineConfig {
                refresh_interval_secs: parse_var(&lookup, "REFRESH_INTERVAL_SECS")?
                    .unwrap_or(defaults.engine.refresh_interval_secs),
                fetch_timeout_secs: parse_var(&lookup, "FETCH_TIMEOUT_SECS")?
                    .unwrap_or(defaults.engine.fetch_timeout_secs),
                reset_acks_on_refresh: parse_var(&lookup, "RESET_ACKS_ON_REFRESH")?
                    .unwrap_or(defaults.engine.reset_acks_on_refresh),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.engine.refresh_interval_secs == 0 {
            return Err(crate::Error::Config(
                "REFRESH_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        if self.engine.fetch_timeout_secs == 0 {
            return Err(crate::Error::Config(
                "FETCH_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        match &self.api.fixtures_dir {
            Some(dir) => {
                if !dir.is_dir() {
                    return Err(crate::Error::Config(format!(
                        "FIXTURES_DIR {} is not a directory",
                        dir.display()
                    )));
                }
            }
            None => {
                self.api.base_url()?;
                if self.api.token.is_none() {
                    tracing::warn!("API_TOKEN is not set. Requests to the API will be unauthenticated.");
                }
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                addr: "0.0.0.0:8080".to_string(),
            },
            api: ApiConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> crate::Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| crate::Error::Config(format!("{} has an invalid value {:?}: {}", key, raw, e))),
        _ => Ok(None),
    }
}
