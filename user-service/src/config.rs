use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use anyhow::{bail, Context, Result};
use discovery::{DiscoveryConfig, RegistrationConfig};
use shared::protocol::USER_SERVICE;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_registration")]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pattern: PatternConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
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
    /// Insert the demo users on startup
    #[serde(default)]
    pub seed_demo_data: bool,
}

/// Read-only values exposed at `/user/prop`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternConfig {
    /// strftime pattern used by `/user/now`
    #[serde(default = "default_dateformat")]
    pub dateformat: String,
    #[serde(default)]
    pub env_shared_value: String,
    #[serde(default)]
    pub name: String,
}

fn default_registration() -> RegistrationConfig {
    RegistrationConfig::named(USER_SERVICE)
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8081))
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/var/lib/cloud-demo/user.db")
}

fn default_dateformat() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
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

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            dateformat: default_dateformat(),
            env_shared_value: String::new(),
            name: String::new(),
        }
    }
}

impl PatternConfig {
    /// chrono panics when formatting with a broken pattern, so reject it up front
    fn validate(&self) -> Result<()> {
        if StrftimeItems::new(&self.dateformat).any(|item| matches!(item, Item::Error)) {
            bail!("Invalid pattern.dateformat: {:?}", self.dateformat);
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.pattern.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use discovery::DiscoveryMode;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.registration.name, USER_SERVICE);
        assert_eq!(config.api.listen, default_listen());
        assert_eq!(config.pattern.dateformat, "%Y-%m-%d %H:%M:%S");
        assert!(!config.database.seed_demo_data);
        assert_eq!(config.discovery.mode, DiscoveryMode::Static);
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
            [registration]
            name = "userservice"
            advertise = "192.168.1.20:8081"
            cluster = "HZ"
            weight = 2

            [api]
            listen = "0.0.0.0:8081"

            [database]
            path = "/tmp/user.db"
            seed_demo_data = true

            [pattern]
            dateformat = "%H:%M"
            name = "local"

            [discovery]
            mode = "mdns"
            interface = "eth0"
            "#,
        )
        .unwrap();

        assert_eq!(config.registration.cluster.as_deref(), Some("HZ"));
        assert_eq!(config.registration.weight, 2);
        assert!(config.database.seed_demo_data);
        assert_eq!(config.pattern.dateformat, "%H:%M");
        assert_eq!(config.discovery.mode, DiscoveryMode::Mdns);
    }

    #[test]
    fn test_rejects_bad_dateformat() {
        assert!(Config::parse("[pattern]\ndateformat = \"%Y-%Q\"").is_err());
    }
}
