use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use mdns_sd::{ServiceDaemon, ServiceEvent};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::Future;
use anyhow::Result;
use chrono::Utc;
use shared::protocol::{mdns_service_type, service_from_mdns_type, TXT_CLUSTER, TXT_INSTANCE_ID, TXT_WEIGHT};
use shared::types::ServiceInstance;
use crate::catalog::Catalog;

type RecvResult = (usize, flume::Receiver<ServiceEvent>, std::result::Result<ServiceEvent, flume::RecvError>);
type RecvFuture = Pin<Box<dyn Future<Output = RecvResult> + Send>>;

/// Each future owns a clone of its receiver so the set of browses can grow
/// while others are pending.
fn make_recv_future(idx: usize, rx: flume::Receiver<ServiceEvent>) -> RecvFuture {
    Box::pin(async move {
        let result = rx.recv_async().await;
        (idx, rx, result)
    })
}

/// Browse every service name received on `watch_rx` and mirror resolved and
/// removed instances into `catalog` until cancelled.
pub async fn run_browser(
    daemon: ServiceDaemon,
    mut watch_rx: mpsc::UnboundedReceiver<String>,
    catalog: Arc<Catalog>,
    cancel: CancellationToken,
) -> Result<()> {
    tracing::info!("Starting mDNS browser");

    let mut browsed_types = HashSet::new();
    let mut next_idx = 0usize;
    let mut type_futures: FuturesUnordered<RecvFuture> = FuturesUnordered::new();

    loop {
        tokio::select! {
            Some(service) = watch_rx.recv() => {
                let service_type = mdns_service_type(&service);
                if browsed_types.insert(service_type.clone()) {
                    tracing::info!("Watching service {}", service);
                    match daemon.browse(&service_type) {
                        Ok(receiver) => {
                            let idx = next_idx;
                            next_idx += 1;
                            type_futures.push(make_recv_future(idx, receiver));
                        }
                        Err(e) => {
                            tracing::error!("Failed to browse {}: {}", service_type, e);
                        }
                    }
                }
            }

            Some((idx, rx, result)) = type_futures.next() => {
                match result {
                    Ok(ServiceEvent::ServiceResolved(info)) => {
                        if let Some(instance) = convert_service_info(&info) {
                            tracing::debug!("Resolved instance {} at {}", instance.instance_id, instance.address);
                            if catalog.upsert(info.get_fullname(), instance) {
                                tracing::info!("New instance {}", info.get_fullname());
                            }
                        }
                        type_futures.push(make_recv_future(idx, rx));
                    }
                    Ok(ServiceEvent::ServiceRemoved(service_type, fullname)) => {
                        tracing::info!("Instance removed: {}", fullname);
                        if let Some(service) = service_from_mdns_type(&service_type) {
                            catalog.remove(service, &fullname);
                        }
                        type_futures.push(make_recv_future(idx, rx));
                    }
                    Ok(_) => {
                        type_futures.push(make_recv_future(idx, rx));
                    }
                    Err(e) => {
                        tracing::warn!("Receiver {} disconnected: {}", idx, e);
                    }
                }
            }

            _ = cancel.cancelled() => {
                tracing::info!("mDNS browser shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Convert an mdns-sd ServiceInfo to a ServiceInstance.
/// IPv4 addresses are preferred; the lowest address wins so repeated
/// resolutions pick the same one.
fn convert_service_info(info: &mdns_sd::ServiceInfo) -> Option<ServiceInstance> {
    let service = service_from_mdns_type(info.get_type())?;

    let mut addresses: Vec<IpAddr> = info.get_addresses().iter().copied().collect();
    addresses.sort_by_key(|addr| (addr.is_ipv6(), *addr));
    let Some(ip) = addresses.first() else {
        tracing::debug!("Skipping instance {} - no addresses", info.get_fullname());
        return None;
    };

    let mut txt: HashMap<String, String> = info
        .get_properties()
        .iter()
        .map(|prop| (prop.key().to_string(), prop.val_str().to_string()))
        .collect();

    let weight = txt
        .remove(TXT_WEIGHT)
        .and_then(|w| w.parse().ok())
        .unwrap_or(1);
    let cluster = txt.remove(TXT_CLUSTER);
    let instance_id = txt
        .remove(TXT_INSTANCE_ID)
        .unwrap_or_else(|| info.get_fullname().to_string());

    Some(ServiceInstance {
        service: service.to_string(),
        instance_id,
        address: SocketAddr::new(*ip, info.get_port()),
        weight,
        cluster,
        healthy: true,
        metadata: txt,
        registered_at: Utc::now(),
    })
}
