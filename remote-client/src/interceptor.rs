use std::time::Duration;
use reqwest::header::HeaderName;
use crate::context;
use crate::error::RemoteError;
use crate::spec::RemoteRequest;
use crate::transport::RemoteResponse;

/// What to do with a failed call
#[derive(Debug)]
pub enum Recovery {
    /// Hand the (possibly replaced) error to the next interceptor, or to the caller
    Propagate(RemoteError),
    /// Decode this value instead of a response body
    Fallback(serde_json::Value),
    /// Resolve and dispatch again after a pause
    Retry { after: Duration },
}

/// Hooks around one remote call.
///
/// Interceptors of a client run in registration order: `on_request` once
/// before the first dispatch, `on_response` after every response received,
/// and `on_error` for every failure until one of them returns something
/// other than [`Recovery::Propagate`].
pub trait Interceptor: Send + Sync {
    fn on_request(&self, _request: &mut RemoteRequest) {}

    fn on_response(&self, _request: &RemoteRequest, _response: &RemoteResponse) {}

    fn on_error(&self, _request: &RemoteRequest, error: RemoteError) -> Recovery {
        Recovery::Propagate(error)
    }
}

/// Copies selected headers of the inbound request onto outbound calls
#[derive(Debug, Clone)]
pub struct HeaderPropagation {
    names: Vec<HeaderName>,
}

impl HeaderPropagation {
    pub fn new(names: Vec<HeaderName>) -> Self {
        Self { names }
    }
}

impl Interceptor for HeaderPropagation {
    fn on_request(&self, request: &mut RemoteRequest) {
        for name in &self.names {
            if request.headers.contains_key(name) {
                continue;
            }
            if let Some(value) = context::inbound_header(name) {
                request.headers.insert(name.clone(), value);
            }
        }
    }
}

/// Retries retryable failures until `max_attempts` dispatches have been made
#[derive(Debug, Clone)]
pub struct RetryInterceptor {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryInterceptor {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self { max_attempts, backoff }
    }
}

impl Interceptor for RetryInterceptor {
    fn on_error(&self, request: &RemoteRequest, error: RemoteError) -> Recovery {
        if error.is_retryable() && request.attempt() < self.max_attempts {
            tracing::warn!(
                "{}.{} attempt {}/{} failed: {}",
                request.service,
                request.operation,
                request.attempt(),
                self.max_attempts,
                error
            );
            Recovery::Retry { after: self.backoff }
        } else {
            Recovery::Propagate(error)
        }
    }
}

/// Substitutes a fixed value when a call cannot be completed
#[derive(Debug, Clone)]
pub struct FallbackInterceptor {
    value: serde_json::Value,
}

impl FallbackInterceptor {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }
}

impl Interceptor for FallbackInterceptor {
    fn on_error(&self, request: &RemoteRequest, error: RemoteError) -> Recovery {
        // Decode and binding failures always surface
        if matches!(error, RemoteError::Binding { .. } | RemoteError::Decode { .. }) {
            return Recovery::Propagate(error);
        }
        tracing::warn!(
            "{}.{} failed, using fallback: {}",
            request.service,
            request.operation,
            error
        );
        Recovery::Fallback(self.value.clone())
    }
}
