use std::time::Duration;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use shared::types::ServiceInstance;
use crate::spec::RemoteRequest;

#[derive(Debug, Clone)]
pub struct RemoteResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

/// Sends a bound request to one chosen instance
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        target: &ServiceInstance,
        request: &RemoteRequest,
        timeout: Duration,
    ) -> Result<RemoteResponse, TransportError>;
}

/// HTTP/1.1 transport over a pooled reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { client })
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        target: &ServiceInstance,
        request: &RemoteRequest,
        timeout: Duration,
    ) -> Result<RemoteResponse, TransportError> {
        let url = format!("{}{}", target.base_url(), request.path);

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers.clone())
            .timeout(timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(classify)?;

        Ok(RemoteResponse { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::{Path, Query}, http::HeaderMap as AxumHeaders, routing::get, Json, Router};
    use reqwest::Method;
    use std::collections::HashMap;
    use std::net::SocketAddr;

    async fn spawn_server() -> SocketAddr {
        async fn user(
            Path(id): Path<i64>,
            Query(query): Query<HashMap<String, String>>,
            headers: AxumHeaders,
        ) -> Json<serde_json::Value> {
            Json(serde_json::json!({
                "id": id,
                "verbose": query.get("verbose"),
                "tenant": headers.get("x-tenant").and_then(|v| v.to_str().ok()),
            }))
        }

        async fn slow() -> &'static str {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "late"
        }

        let app = Router::new()
            .route("/user/:id", get(user))
            .route("/slow", get(slow));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn request(path: &str) -> RemoteRequest {
        RemoteRequest {
            service: "userservice".into(),
            operation: "test",
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            attempt: 1,
        }
    }

    #[tokio::test]
    async fn test_sends_path_query_and_headers() {
        let addr = spawn_server().await;
        let target = ServiceInstance::new("userservice", "local", addr);
        let transport = HttpTransport::new(Duration::from_secs(1)).unwrap();

        let mut req = request("/user/110");
        req.query.push(("verbose".into(), "true".into()));
        req.headers.insert("x-tenant", "acme".parse().unwrap());

        let response = transport.send(&target, &req, Duration::from_secs(5)).await.unwrap();
        assert_eq!(response.status, StatusCode::OK);

        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["id"], 110);
        assert_eq!(body["verbose"], "true");
        assert_eq!(body["tenant"], "acme");
    }

    #[tokio::test]
    async fn test_unknown_path_returns_status() {
        let addr = spawn_server().await;
        let target = ServiceInstance::new("userservice", "local", addr);
        let transport = HttpTransport::new(Duration::from_secs(1)).unwrap();

        let response = transport
            .send(&target, &request("/missing"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_read_timeout() {
        let addr = spawn_server().await;
        let target = ServiceInstance::new("userservice", "local", addr);
        let transport = HttpTransport::new(Duration::from_secs(1)).unwrap();

        let err = transport
            .send(&target, &request("/slow"), Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let target = ServiceInstance::new("userservice", "gone", addr);
        let transport = HttpTransport::new(Duration::from_secs(1)).unwrap();

        let err = transport
            .send(&target, &request("/user/1"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect(_)), "got {:?}", err);
    }
}
