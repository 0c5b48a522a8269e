use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::Duration;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use shared::types::ServiceInstance;
use crate::spec::RemoteRequest;
use crate::transport::{RemoteResponse, Transport, TransportError};

/// Transport that records every request and replays queued outcomes.
/// With nothing queued it answers 200 with `{}`.
#[derive(Default)]
pub struct MockTransport {
    outcomes: Mutex<VecDeque<Result<RemoteResponse, TransportError>>>,
    calls: Mutex<Vec<(SocketAddr, RemoteRequest)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status: StatusCode, body: &str) -> &Self {
        self.outcomes.lock().push_back(Ok(RemoteResponse {
            status,
            headers: HeaderMap::new(),
            body: Bytes::copy_from_slice(body.as_bytes()),
        }));
        self
    }

    pub fn fail(&self, error: TransportError) -> &Self {
        self.outcomes.lock().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<(SocketAddr, RemoteRequest)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        target: &ServiceInstance,
        request: &RemoteRequest,
        _timeout: Duration,
    ) -> Result<RemoteResponse, TransportError> {
        self.calls.lock().push((target.address, request.clone()));
        self.outcomes.lock().pop_front().unwrap_or_else(|| {
            Ok(RemoteResponse {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: Bytes::from_static(b"{}"),
            })
        })
    }
}

pub fn instance(id: &str, port: u16) -> ServiceInstance {
    ServiceInstance::new("userservice", id, ([127, 0, 0, 1], port).into())
}
