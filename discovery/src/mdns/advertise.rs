use std::collections::HashMap;
use mdns_sd::{ServiceDaemon, ServiceInfo};
use anyhow::{Context, Result};
use shared::protocol::{mdns_service_type, TXT_CLUSTER, TXT_INSTANCE_ID, TXT_WEIGHT};
use shared::types::ServiceInstance;

/// Advertise `instance` as `<instance_id>._<service>._tcp.local.`
pub fn register_instance(daemon: &ServiceDaemon, instance: &ServiceInstance) -> Result<ServiceInfo> {
    let hostname = hostname::get()
        .context("Failed to get system hostname")?
        .to_string_lossy()
        .to_string();
    let host_name = format!("{}.local.", hostname.trim_end_matches(".local"));

    let service_type = mdns_service_type(&instance.service);

    let mut txt_records = instance.metadata.clone();
    txt_records.extend(HashMap::from([
        (TXT_WEIGHT.to_string(), instance.weight.to_string()),
        (TXT_INSTANCE_ID.to_string(), instance.instance_id.clone()),
    ]));
    if let Some(cluster) = &instance.cluster {
        txt_records.insert(TXT_CLUSTER.to_string(), cluster.clone());
    }

    let ip = instance.address.ip().to_string();
    let service_info = ServiceInfo::new(
        &service_type,
        &instance.instance_id,
        &host_name,
        ip.as_str(),
        instance.address.port(),
        txt_records,
    )
    .context("Failed to create ServiceInfo")?;

    daemon
        .register(service_info.clone())
        .context("Failed to register mDNS service")?;

    tracing::info!(
        "Registered {} as {} on {}",
        service_type,
        instance.instance_id,
        instance.address
    );

    Ok(service_info)
}

pub fn unregister_instance(daemon: &ServiceDaemon, fullname: &str) -> Result<()> {
    daemon
        .unregister(fullname)
        .context("Failed to unregister mDNS service")?;

    tracing::info!("Unregistered {}", fullname);
    Ok(())
}
