use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use parking_lot::Mutex;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderName, StatusCode},
    routing::get,
    Json, Router,
};
use discovery::{InMemoryRegistry, ServiceInstance, ServiceRegistry};
use remote_client::interceptor::HeaderPropagation;
use remote_client::{ClientConfig, HttpTransport, UserClient};
use shared::protocol::{REQUEST_ID_HEADER, USER_SERVICE};
use shared::types::User;

/// A user-service stand-in on a loopback port that knows user 1 only
pub struct FakeUsers {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<String>>>,
}

impl FakeUsers {
    pub async fn spawn() -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/user/:id", get(find_user))
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, seen }
    }

    pub fn registry(&self) -> Arc<dyn ServiceRegistry> {
        Arc::new(InMemoryRegistry::with_instances([ServiceInstance::new(
            USER_SERVICE,
            "userservice-test",
            self.addr,
        )]))
    }

    /// `x-request-id` values received, one per call
    pub fn request_ids(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

async fn find_user(
    State(seen): State<Arc<Mutex<Vec<String>>>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<User>, StatusCode> {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    seen.lock().push(request_id);

    if id == 1 {
        Ok(Json(User {
            id: 1,
            username: "alice".to_string(),
            address: "Hangzhou".to_string(),
        }))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

/// A user client over real HTTP that forwards `x-request-id`
pub fn user_client(registry: Arc<dyn ServiceRegistry>) -> UserClient {
    let config = ClientConfig::builder()
        .connect_timeout(Duration::from_secs(1))
        .read_timeout(Duration::from_secs(2))
        .interceptor(HeaderPropagation::new(vec![HeaderName::from_static(REQUEST_ID_HEADER)]))
        .build();
    let transport = Arc::new(HttpTransport::new(config.connect_timeout()).unwrap());
    UserClient::new(registry, transport, config).unwrap()
}
