//! Declarative HTTP client for calling other services by logical name.
//!
//! A client is declared as a static table of [`CallSpec`]s. Building a
//! [`RemoteClient`] validates the table once and yields one [`Operation`] per
//! entry; calling an operation binds its arguments into a request, resolves
//! the service through a [`ServiceRegistry`], picks an instance with the
//! configured [`LoadBalancer`], and decodes the JSON response.

pub mod balancer;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod interceptor;
pub mod spec;
pub mod transport;
pub mod user_client;

#[cfg(test)]
pub(crate) mod testing;

pub use balancer::{BalancerKind, LoadBalancer};
pub use client::{Operation, RemoteClient, RemoteClientBuilder};
pub use config::{ClientConfig, ClientSettings, ClientsConfig, LogLevel};
pub use discovery::ServiceRegistry;
pub use error::{RemoteError, SpecError};
pub use interceptor::{Interceptor, Recovery};
pub use spec::{CallSpec, Param, ParamKind, RemoteRequest};
pub use transport::{HttpTransport, RemoteResponse, Transport, TransportError};
pub use user_client::UserClient;
