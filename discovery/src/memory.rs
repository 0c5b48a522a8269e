use anyhow::Result;
use shared::types::ServiceInstance;
use crate::catalog::Catalog;
use crate::registry::ServiceRegistry;

/// Registry living entirely in process memory.
/// Seeded from configuration for fixed deployments, and used by tests.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    catalog: Catalog,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instances(instances: impl IntoIterator<Item = ServiceInstance>) -> Self {
        let registry = Self::new();
        for instance in instances {
            registry.catalog.upsert(&instance.instance_id.clone(), instance);
        }
        registry
    }
}

impl ServiceRegistry for InMemoryRegistry {
    fn register(&self, instance: &ServiceInstance) -> Result<()> {
        self.catalog.upsert(&instance.instance_id, instance.clone());
        tracing::info!(
            "Registered {} as {} at {}",
            instance.service,
            instance.instance_id,
            instance.address
        );
        Ok(())
    }

    fn deregister(&self, instance: &ServiceInstance) -> Result<()> {
        if self.catalog.remove(&instance.service, &instance.instance_id).is_some() {
            tracing::info!("Deregistered {}", instance.instance_id);
        }
        Ok(())
    }

    fn instances(&self, service: &str) -> Vec<ServiceInstance> {
        self.catalog.instances(service)
    }
}
