use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use serde::Deserialize;
use anyhow::{Context, Result};
use discovery::{DiscoveryConfig, RegistrationConfig};
use remote_client::ClientsConfig;
use shared::protocol::ORDER_SERVICE;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_registration")]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// Settings for outbound calls to other services
    #[serde(default)]
    pub clients: ClientsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub seed_demo_data: bool,
}

fn default_registration() -> RegistrationConfig {
    RegistrationConfig::named(ORDER_SERVICE)
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/var/lib/cloud-demo/order.db")
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            seed_demo_data: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}
