//! Service registration and name resolution.
//!
//! A process registers its own [`ServiceInstance`] under a logical name and
//! resolves the names of the services it calls. Two registries are provided:
//! an in-memory one seeded from configuration, and one backed by mDNS/DNS-SD.

pub mod catalog;
pub mod config;
pub mod mdns;
pub mod memory;
pub mod registry;

pub use config::{open, DiscoveryConfig, DiscoveryMode, RegistrationConfig};
pub use memory::InMemoryRegistry;
pub use registry::ServiceRegistry;
pub use shared::types::ServiceInstance;
