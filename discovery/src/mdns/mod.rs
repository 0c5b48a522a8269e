pub mod advertise;
pub mod browser;

use std::collections::HashMap;
use std::sync::Arc;
use anyhow::{Context, Result};
use mdns_sd::ServiceDaemon;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use shared::types::ServiceInstance;
use crate::catalog::Catalog;
use crate::registry::ServiceRegistry;

/// Registry backed by mDNS/DNS-SD on the local link.
/// Own instances are advertised through the daemon; watched services are
/// browsed by a background task that keeps the catalog current.
pub struct MdnsRegistry {
    daemon: ServiceDaemon,
    catalog: Arc<Catalog>,
    watch_tx: mpsc::UnboundedSender<String>,
    /// instance_id -> mDNS fullname of our own registrations
    registered: Mutex<HashMap<String, String>>,
    cancel: CancellationToken,
}

impl MdnsRegistry {
    /// Create the mDNS daemon, optionally restricted to one interface, and
    /// spawn the browse task. Must be called inside a tokio runtime.
    pub fn open(interface: Option<&str>, cancel: CancellationToken) -> Result<Self> {
        let daemon = ServiceDaemon::new().context("Failed to create mDNS daemon")?;

        if let Some(interface) = interface {
            daemon
                .disable_interface(mdns_sd::IfKind::All)
                .context("Failed to disable default interfaces")?;
            daemon
                .enable_interface(interface)
                .with_context(|| format!("Failed to enable interface {}", interface))?;
        }

        let catalog = Arc::new(Catalog::new());
        let (watch_tx, watch_rx) = mpsc::unbounded_channel();

        let browser_daemon = daemon.clone();
        let browser_catalog = catalog.clone();
        let browser_cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = browser::run_browser(browser_daemon, watch_rx, browser_catalog, browser_cancel).await {
                tracing::error!("mDNS browser error: {}", e);
            }
        });

        Ok(Self {
            daemon,
            catalog,
            watch_tx,
            registered: Mutex::new(HashMap::new()),
            cancel,
        })
    }
}

impl ServiceRegistry for MdnsRegistry {
    fn register(&self, instance: &ServiceInstance) -> Result<()> {
        let info = advertise::register_instance(&self.daemon, instance)?;
        self.registered
            .lock()
            .insert(instance.instance_id.clone(), info.get_fullname().to_string());
        Ok(())
    }

    fn deregister(&self, instance: &ServiceInstance) -> Result<()> {
        let fullname = self.registered.lock().remove(&instance.instance_id);
        match fullname {
            Some(fullname) => advertise::unregister_instance(&self.daemon, &fullname),
            None => {
                tracing::warn!("Instance {} was not registered", instance.instance_id);
                Ok(())
            }
        }
    }

    fn instances(&self, service: &str) -> Vec<ServiceInstance> {
        self.catalog.instances(service)
    }

    fn watch(&self, service: &str) -> Result<()> {
        self.watch_tx
            .send(service.to_string())
            .context("mDNS browser is not running")?;
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        self.cancel.cancel();
        self.daemon
            .shutdown()
            .context("Failed to shutdown mDNS daemon")?;
        Ok(())
    }
}
