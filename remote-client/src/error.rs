use std::net::SocketAddr;
use std::time::Duration;
use reqwest::StatusCode;
use shared::template::TemplateError;

/// Why a remote call did not produce a value.
/// A 404 is not an error: operations report it as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// No live instance of the service is known; nothing was sent
    #[error("no live instance of service {service}")]
    Unresolvable { service: String },

    #[error("call to {service} at {target} timed out after {timeout:?}")]
    Timeout {
        service: String,
        target: SocketAddr,
        timeout: Duration,
    },

    #[error("could not connect to {service} at {target}: {message}")]
    Connect {
        service: String,
        target: SocketAddr,
        message: String,
    },

    #[error("{service} answered with HTTP {status}")]
    Status {
        service: String,
        status: StatusCode,
        body: String,
    },

    #[error("call to {service} at {target} failed: {message}")]
    Transport {
        service: String,
        target: SocketAddr,
        message: String,
    },

    #[error("failed to decode response from {service}: {message}")]
    Decode { service: String, message: String },

    /// Arguments did not fit the operation's declaration; nothing was sent
    #[error("cannot bind arguments for {operation}: {message}")]
    Binding { operation: String, message: String },
}

impl RemoteError {
    /// Failures where another attempt, possibly on another instance, may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Timeout { .. }
            | RemoteError::Connect { .. }
            | RemoteError::Transport { .. } => true,
            RemoteError::Status { status, .. } => status.is_server_error(),
            RemoteError::Unresolvable { .. }
            | RemoteError::Decode { .. }
            | RemoteError::Binding { .. } => false,
        }
    }
}

/// A call spec table that cannot be turned into operations
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("operation {operation}: {source}")]
    Template {
        operation: String,
        #[source]
        source: TemplateError,
    },

    #[error("operation {operation}: parameter {param:?} declared twice")]
    DuplicateParam { operation: String, param: String },

    #[error("operation {operation}: placeholder {{{placeholder}}} has no matching parameter")]
    UnboundPlaceholder { operation: String, placeholder: String },

    #[error("operation {operation}: parameter {param:?} is marked {kind} but names a path placeholder")]
    PlaceholderKind {
        operation: String,
        param: String,
        kind: &'static str,
    },

    #[error("operation {operation}: {param:?} is not a valid header name")]
    InvalidHeaderName { operation: String, param: String },

    #[error("operation {0} is defined twice")]
    DuplicateOperation(String),

    #[error("client for {service} has no operation {operation}")]
    MissingOperation { service: String, operation: String },
}
