/// Logical name user-service registers under
pub const USER_SERVICE: &str = "userservice";

/// Logical name order-service registers under
pub const ORDER_SERVICE: &str = "orderservice";

/// TXT record keys used when advertising an instance over mDNS
pub const TXT_WEIGHT: &str = "weight";
pub const TXT_CLUSTER: &str = "cluster";
pub const TXT_INSTANCE_ID: &str = "instance";

/// Header carrying the request id across service hops
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// mDNS service type for a logical service name, e.g. "_userservice._tcp.local."
pub fn mdns_service_type(service: &str) -> String {
    format!("_{}._tcp.local.", service)
}

/// Inverse of [`mdns_service_type`]
pub fn service_from_mdns_type(service_type: &str) -> Option<&str> {
    service_type
        .strip_prefix('_')?
        .strip_suffix("._tcp.local.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mdns_type_round_trips() {
        let ty = mdns_service_type(USER_SERVICE);
        assert_eq!(ty, "_userservice._tcp.local.");
        assert_eq!(service_from_mdns_type(&ty), Some(USER_SERVICE));
        assert_eq!(service_from_mdns_type("_http._udp.local."), None);
    }
}
