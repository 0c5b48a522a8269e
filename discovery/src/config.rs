use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use serde::Deserialize;
use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;
use shared::types::ServiceInstance;
use crate::mdns::MdnsRegistry;
use crate::memory::InMemoryRegistry;
use crate::registry::ServiceRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    /// Instances listed in configuration
    Static,
    /// mDNS/DNS-SD on the local link
    Mdns,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_mode")]
    pub mode: DiscoveryMode,

    /// Interface the mDNS daemon binds to; all interfaces when unset
    #[serde(default)]
    pub interface: Option<String>,

    /// Known instances of other services, used in static mode
    #[serde(default)]
    pub instances: Vec<StaticInstance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaticInstance {
    pub service: String,
    pub address: SocketAddr,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub cluster: Option<String>,
}

/// How this process announces itself
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
    /// Logical service name, e.g. "userservice"
    pub name: String,

    /// Address other services should call; defaults to the listen address
    #[serde(default)]
    pub advertise: Option<SocketAddr>,

    #[serde(default = "default_weight")]
    pub weight: u32,

    #[serde(default)]
    pub cluster: Option<String>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl RegistrationConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            advertise: None,
            weight: default_weight(),
            cluster: None,
            metadata: HashMap::new(),
        }
    }

    /// The instance to register for a server bound to `listen`
    pub fn to_instance(&self, listen: SocketAddr) -> Result<ServiceInstance> {
        let address = self.advertise.unwrap_or(listen);
        if address.ip().is_unspecified() {
            bail!(
                "Cannot advertise {} for {}: set an explicit advertise address",
                address,
                self.name
            );
        }

        let hostname = hostname::get()
            .context("Failed to get system hostname")?
            .to_string_lossy()
            .to_string();

        let mut instance = ServiceInstance::new(
            self.name.clone(),
            format!("{}-{}-{}", self.name, hostname, address.port()),
            address,
        );
        instance.weight = self.weight;
        instance.cluster = self.cluster.clone();
        instance.metadata = self.metadata.clone();
        Ok(instance)
    }
}

fn default_mode() -> DiscoveryMode {
    DiscoveryMode::Static
}

fn default_weight() -> u32 {
    1
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            interface: None,
            instances: Vec::new(),
        }
    }
}

impl StaticInstance {
    fn to_instance(&self) -> ServiceInstance {
        let mut instance = ServiceInstance::new(
            self.service.clone(),
            format!("{}-{}", self.service, self.address),
            self.address,
        );
        instance.weight = self.weight;
        instance.cluster = self.cluster.clone();
        instance
    }
}

/// Build the registry selected by `config`
pub fn open(config: &DiscoveryConfig, cancel: CancellationToken) -> Result<Arc<dyn ServiceRegistry>> {
    match config.mode {
        DiscoveryMode::Static => {
            tracing::info!("Using static discovery with {} instances", config.instances.len());
            Ok(Arc::new(InMemoryRegistry::with_instances(
                config.instances.iter().map(StaticInstance::to_instance),
            )))
        }
        DiscoveryMode::Mdns => {
            tracing::info!("Using mDNS discovery");
            Ok(Arc::new(MdnsRegistry::open(config.interface.as_deref(), cancel)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_config_seeds_registry() {
        let config: DiscoveryConfig = toml::from_str(
            r#"
            mode = "static"

            [[instances]]
            service = "userservice"
            address = "127.0.0.1:8081"

            [[instances]]
            service = "userservice"
            address = "127.0.0.1:8082"
            weight = 3
            cluster = "HZ"
            "#,
        )
        .unwrap();

        let registry = open(&config, CancellationToken::new()).unwrap();
        let instances = registry.instances("userservice");

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[1].weight, 3);
        assert_eq!(instances[1].cluster.as_deref(), Some("HZ"));
    }

    #[test]
    fn test_registration_uses_listen_address() {
        let config = RegistrationConfig::named("userservice");
        let instance = config.to_instance("127.0.0.1:8081".parse().unwrap()).unwrap();

        assert_eq!(instance.service, "userservice");
        assert_eq!(instance.address.port(), 8081);
        assert!(instance.instance_id.starts_with("userservice-"));
        assert!(instance.instance_id.ends_with("-8081"));
    }

    #[test]
    fn test_registration_needs_concrete_address() {
        let mut config = RegistrationConfig::named("userservice");
        assert!(config.to_instance("0.0.0.0:8081".parse().unwrap()).is_err());

        config.advertise = Some("10.0.0.5:9000".parse().unwrap());
        let instance = config.to_instance("0.0.0.0:8081".parse().unwrap()).unwrap();
        assert_eq!(instance.address, "10.0.0.5:9000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_defaults_to_static() {
        let config: DiscoveryConfig = toml::from_str("").unwrap();
        assert_eq!(config.mode, DiscoveryMode::Static);
        assert!(config.instances.is_empty());
    }
}
