use std::collections::HashMap;
use parking_lot::RwLock;
use shared::types::ServiceInstance;

/// Known instances keyed by service name, then by instance key
#[derive(Debug, Default)]
pub struct Catalog {
    services: RwLock<HashMap<String, HashMap<String, ServiceInstance>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an instance. Returns true if it was not known before.
    pub fn upsert(&self, key: &str, instance: ServiceInstance) -> bool {
        let mut services = self.services.write();
        services
            .entry(instance.service.clone())
            .or_default()
            .insert(key.to_string(), instance)
            .is_none()
    }

    pub fn remove(&self, service: &str, key: &str) -> Option<ServiceInstance> {
        let mut services = self.services.write();
        let instances = services.get_mut(service)?;
        let removed = instances.remove(key);
        if instances.is_empty() {
            services.remove(service);
        }
        removed
    }

    /// Healthy instances of `service`, ordered by instance id
    pub fn instances(&self, service: &str) -> Vec<ServiceInstance> {
        let services = self.services.read();
        let mut instances: Vec<ServiceInstance> = services
            .get(service)
            .map(|by_key| by_key.values().filter(|i| i.healthy).cloned().collect())
            .unwrap_or_default();
        instances.sort_by(|a, b| a.instance_id.cmp(&b.instance_id));
        instances
    }
}
