use anyhow::Result;
use shared::types::ServiceInstance;

/// Registration and lookup of service instances by logical name.
///
/// Lookups are synchronous reads of a locally maintained catalog; whatever
/// keeps that catalog current (configuration, an mDNS browse task) runs
/// outside the request path.
pub trait ServiceRegistry: Send + Sync {
    /// Announce `instance` under its logical service name
    fn register(&self, instance: &ServiceInstance) -> Result<()>;

    /// Withdraw a previously registered instance
    fn deregister(&self, instance: &ServiceInstance) -> Result<()>;

    /// Healthy instances currently known for `service`
    fn instances(&self, service: &str) -> Vec<ServiceInstance>;

    /// Start tracking instances of `service`.
    /// Registries whose catalog is fully known up front ignore this.
    fn watch(&self, _service: &str) -> Result<()> {
        Ok(())
    }

    /// Release network resources held by the registry
    fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}
