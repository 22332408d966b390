/// Configuration for the catalog client, cache, planner and server
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Top-level configuration, loaded from a JSON file.
///
/// Every field has a default, so `{}` is a valid file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub cache: CacheConfig,
    pub schedule: ScheduleConfig,
    pub server: ServerConfig,
}

/// Where and how to scrape the course catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    /// Index page listing every minor
    pub minors_page: String,
    /// Admissions page listing every major
    pub majors_page: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Requirement pages fetched at once; 1 is fully sequential
    pub fetch_concurrency: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://catalog.purdue.edu".to_string(),
            minors_page: "https://catalog.purdue.edu/content.php?catoid=13&navoid=16362"
                .to_string(),
            majors_page: "https://www.admissions.purdue.edu/majors/".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            fetch_concurrency: 1,
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 30 * 60 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub per_semester: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { per_semester: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl AppConfig {
    /// Loads the configuration file at `path`, or the defaults when no path
    /// is given.
    ///
    /// # Arguments
    /// * `path` - Path to a JSON config file
    ///
    /// # Returns
    /// * `Ok(AppConfig)` - Loaded configuration
    /// * `Err` - If the file can't be read or parsed
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}
