//! Optional TOML configuration. Every section has defaults so an absent
//! file behaves like an empty one.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{InsightsError, Result};
use crate::timeseries::TimeRange;

pub const DEFAULT_CONFIG_FILE: &str = "insights.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub analytics: AnalyticsConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Fixes placeholder chart data between runs when set.
    pub seed: Option<u64>,
    pub default_range: TimeRange,
    pub catalog: Option<PathBuf>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            seed: None,
            default_range: TimeRange::Month,
            catalog: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub quick_access_limit: usize,
    pub search_limit: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            quick_access_limit: 5,
            search_limit: 20,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(InsightsError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|source| InsightsError::Io {
            source,
            context: format!("reading config {}", path.display()),
        })?;
        Self::from_toml(&raw)
    }

    /// Loads an explicit path, or the default file if present, or defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            return Err(InsightsError::InvalidConfigValue {
                path: "database.max_connections".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.report.search_limit == 0 {
            return Err(InsightsError::InvalidConfigValue {
                path: "report.search_limit".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// `DATABASE_URL` wins over the configured url.
    pub fn database_url(&self, env: Option<String>) -> Option<String> {
        env.or_else(|| self.database.url.clone())
    }
}
