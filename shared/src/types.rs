use std::collections::HashMap;
use std::net::SocketAddr;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

/// A user record as stored in `tb_user`.
/// Served by user-service and decoded by every caller of the user client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub address: String,
}

/// An order record as stored in `tb_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,

    pub user_id: i64,

    pub name: String,

    /// Price in minor currency units
    pub price: i64,

    pub num: i32,

    /// Filled in from user-service; absent when the user does not exist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// One registered instance of a logical service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// Logical service name, e.g. "userservice"
    pub service: String,

    /// Unique instance id, e.g. "userservice-nas-8081"
    pub instance_id: String,

    /// Address the instance accepts HTTP on
    pub address: SocketAddr,

    /// Relative weight for weighted balancing; 0 means never chosen
    #[serde(default = "default_weight")]
    pub weight: u32,

    /// Cluster the instance belongs to, if any
    #[serde(default)]
    pub cluster: Option<String>,

    #[serde(default = "default_healthy")]
    pub healthy: bool,

    #[serde(default)]
    pub metadata: HashMap<String, String>,

    pub registered_at: DateTime<Utc>,
}

fn default_weight() -> u32 {
    1
}

fn default_healthy() -> bool {
    true
}

impl ServiceInstance {
    /// A healthy instance with weight 1 and no cluster.
    pub fn new(service: impl Into<String>, instance_id: impl Into<String>, address: SocketAddr) -> Self {
        Self {
            service: service.into(),
            instance_id: instance_id.into(),
            address,
            weight: default_weight(),
            cluster: None,
            healthy: true,
            metadata: HashMap::new(),
            registered_at: Utc::now(),
        }
    }

    /// Base URL of the instance, e.g. `http://127.0.0.1:8081` or `http://[fd00::1]:8081`
    pub fn base_url(&self) -> String {
        format!("http://{}", self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_json_round_trip() {
        let user = User {
            id: 110,
            username: "alice".to_string(),
            address: "Hangzhou".to_string(),
        };

        let json = serde_json::to_string(&user).unwrap();
        let decoded: User = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, user);
    }

    #[test]
    fn test_order_uses_camel_case_and_skips_missing_user() {
        let order = Order {
            id: 101,
            user_id: 1,
            name: "Phone".to_string(),
            price: 699900,
            num: 1,
            user: None,
        };

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["userId"], 1);
        assert!(json.get("user").is_none());
    }

    #[test]
    fn test_base_url_brackets_ipv6() {
        let v4 = ServiceInstance::new("userservice", "a", "127.0.0.1:8081".parse().unwrap());
        let v6 = ServiceInstance::new("userservice", "b", "[fd00::1]:8081".parse().unwrap());

        assert_eq!(v4.base_url(), "http://127.0.0.1:8081");
        assert_eq!(v6.base_url(), "http://[fd00::1]:8081");
    }
}
