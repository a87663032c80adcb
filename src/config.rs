//! Service configuration: YAML file, environment overlay, CLI overlay.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Key used against the NASA API when none is configured. Heavily rate-limited.
pub const NASA_DEMO_KEY: &str = "DEMO_KEY";

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout_secs() -> u64 {
    90
}

fn default_nasa_base_url() -> String {
    "https://api.nasa.gov/neo/rest/v1".to_string()
}

fn default_nasa_timeout_secs() -> u64 {
    10
}

fn default_population_base_url() -> String {
    "https://api.worldpop.org/v1".to_string()
}

fn default_population_dataset() -> String {
    "wpgppop".to_string()
}

fn default_population_year() -> u16 {
    2020
}

fn default_population_timeout_secs() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_max_poll_attempts() -> u32 {
    30
}

fn default_poll_timeout_secs() -> u64 {
    10
}

fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    concat!("neo_impact/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_geocoding_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub nasa: NasaConfig,
    #[serde(default)]
    pub population: PopulationConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for a whole simulate-impact call, independent of the
    /// per-call outbound timeouts.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NasaConfig {
    #[serde(default = "default_nasa_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_nasa_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NasaConfig {
    fn default() -> Self {
        Self {
            base_url: default_nasa_base_url(),
            api_key: None,
            timeout_secs: default_nasa_timeout_secs(),
        }
    }
}

impl NasaConfig {
    /// The configured key, or [`NASA_DEMO_KEY`] when none is set.
    pub fn api_key(&self) -> &str {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .unwrap_or(NASA_DEMO_KEY)
    }

    pub fn uses_demo_key(&self) -> bool {
        self.api_key() == NASA_DEMO_KEY
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    #[serde(default = "default_population_base_url")]
    pub base_url: String,
    #[serde(default = "default_population_dataset")]
    pub dataset: String,
    #[serde(default = "default_population_year")]
    pub year: u16,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_population_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            base_url: default_population_base_url(),
            dataset: default_population_dataset(),
            year: default_population_year(),
            api_key: None,
            timeout_secs: default_population_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl PopulationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// Nominatim rejects requests without an identifying agent.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_geocoding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_geocoding_timeout_secs(),
        }
    }
}

impl GeocodingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter; `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ServiceConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: ServiceConfig =
            serde_yaml::from_str(text).context("Failed to parse service config")?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize service config")
    }

    /// Overlays the process environment on top of the loaded values.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Overlays values from `lookup`, keyed by environment variable name.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(key) = lookup("NASA_API_KEY").filter(|v| !v.is_empty()) {
            self.nasa.api_key = Some(key);
        }
        if let Some(url) = lookup("POPULATION_API_URL") {
            self.population.base_url = url;
        }
        if let Some(dataset) = lookup("POPULATION_DATASET") {
            self.population.dataset = dataset;
        }
        if let Some(year) = lookup("POPULATION_YEAR") {
            self.population.year = year
                .trim()
                .parse()
                .with_context(|| format!("POPULATION_YEAR is not a valid year: '{year}'"))?;
        }
        if let Some(key) = lookup("POPULATION_API_KEY").filter(|v| !v.is_empty()) {
            self.population.api_key = Some(key);
        }
        if let Some(url) = lookup("GEOCODER_URL") {
            self.geocoding.base_url = url;
        }
        if let Some(agent) = lookup("GEOCODER_USER_AGENT") {
            self.geocoding.user_agent = agent;
        }
        Ok(())
    }
}

pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<ServiceConfig> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        ServiceConfig::from_yaml_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}
