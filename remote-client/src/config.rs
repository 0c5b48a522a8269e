use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use anyhow::{Context, Result};
use reqwest::header::HeaderName;
use serde::Deserialize;
use crate::balancer::BalancerKind;
use crate::interceptor::{FallbackInterceptor, HeaderPropagation, Interceptor, RetryInterceptor};

/// How much of each call the client logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    #[default]
    None,
    /// Method, URL, status and elapsed time
    Basic,
    /// Basic plus request and response headers
    Headers,
    /// Headers plus response body
    Full,
}

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_RETRY_BACKOFF_MS: u64 = 100;

/// Behaviour bundle attached to a remote client when it is built.
/// Immutable; several clients may share one through an `Arc`.
pub struct ClientConfig {
    connect_timeout: Duration,
    read_timeout: Duration,
    log_level: LogLevel,
    balancer: BalancerKind,
    preferred_cluster: Option<String>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn balancer(&self) -> BalancerKind {
        self.balancer
    }

    pub fn preferred_cluster(&self) -> Option<&str> {
        self.preferred_cluster.as_deref()
    }

    pub fn interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.interceptors
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfigBuilder::default().build_owned()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("log_level", &self.log_level)
            .field("balancer", &self.balancer)
            .field("preferred_cluster", &self.preferred_cluster)
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

pub struct ClientConfigBuilder {
    connect_timeout: Duration,
    read_timeout: Duration,
    log_level: LogLevel,
    balancer: BalancerKind,
    preferred_cluster: Option<String>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            log_level: LogLevel::default(),
            balancer: BalancerKind::default(),
            preferred_cluster: None,
            interceptors: Vec::new(),
        }
    }
}

impl ClientConfigBuilder {
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn balancer(mut self, kind: BalancerKind) -> Self {
        self.balancer = kind;
        self
    }

    pub fn preferred_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.preferred_cluster = Some(cluster.into());
        self
    }

    /// Append an interceptor; interceptors run in the order they are added
    pub fn interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn build(self) -> Arc<ClientConfig> {
        Arc::new(self.build_owned())
    }

    fn build_owned(self) -> ClientConfig {
        ClientConfig {
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            log_level: self.log_level,
            balancer: self.balancer,
            preferred_cluster: self.preferred_cluster,
            interceptors: self.interceptors,
        }
    }
}

/// Client settings as written in a TOML file.
/// Every field is optional so per-service sections can override the default
/// section field by field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientSettings {
    pub connect_timeout_ms: Option<u64>,
    pub read_timeout_ms: Option<u64>,
    pub log_level: Option<LogLevel>,
    pub load_balancer: Option<BalancerKind>,
    pub preferred_cluster: Option<String>,
    /// Inbound headers copied onto outbound calls
    pub propagate_headers: Option<Vec<String>>,
    pub retry: Option<RetrySettings>,
    /// Value decoded in place of a failed call's response
    pub fallback: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_backoff_ms() -> u64 {
    DEFAULT_RETRY_BACKOFF_MS
}

impl ClientSettings {
    /// Fields set in `over` win over fields set in `self`
    pub fn overlay(&self, over: &ClientSettings) -> ClientSettings {
        ClientSettings {
            connect_timeout_ms: over.connect_timeout_ms.or(self.connect_timeout_ms),
            read_timeout_ms: over.read_timeout_ms.or(self.read_timeout_ms),
            log_level: over.log_level.or(self.log_level),
            load_balancer: over.load_balancer.or(self.load_balancer),
            preferred_cluster: over.preferred_cluster.clone().or_else(|| self.preferred_cluster.clone()),
            propagate_headers: over.propagate_headers.clone().or_else(|| self.propagate_headers.clone()),
            retry: over.retry.clone().or_else(|| self.retry.clone()),
            fallback: over.fallback.clone().or_else(|| self.fallback.clone()),
        }
    }

    /// Build the immutable config. Interceptors are installed as header
    /// propagation, then retry, then fallback, so a fallback only applies
    /// once retries are exhausted.
    pub fn to_config(&self) -> Result<Arc<ClientConfig>> {
        let mut builder = ClientConfig::builder();

        if let Some(ms) = self.connect_timeout_ms {
            builder = builder.connect_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.read_timeout_ms {
            builder = builder.read_timeout(Duration::from_millis(ms));
        }
        if let Some(level) = self.log_level {
            builder = builder.log_level(level);
        }
        if let Some(kind) = self.load_balancer {
            builder = builder.balancer(kind);
        }
        if let Some(cluster) = &self.preferred_cluster {
            builder = builder.preferred_cluster(cluster.clone());
        }

        if let Some(names) = self.propagate_headers.as_ref().filter(|n| !n.is_empty()) {
            let names = names
                .iter()
                .map(|name| {
                    HeaderName::from_bytes(name.as_bytes())
                        .with_context(|| format!("Invalid header name in propagate_headers: {}", name))
                })
                .collect::<Result<Vec<_>>>()?;
            builder = builder.interceptor(HeaderPropagation::new(names));
        }

        if let Some(retry) = self.retry.as_ref().filter(|r| r.max_attempts > 1) {
            builder = builder.interceptor(RetryInterceptor::new(
                retry.max_attempts,
                Duration::from_millis(retry.backoff_ms),
            ));
        }

        if let Some(value) = &self.fallback {
            builder = builder.interceptor(FallbackInterceptor::new(value.clone()));
        }

        Ok(builder.build())
    }
}

/// The `[clients]` section: a default bundle and per-service overrides
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientsConfig {
    #[serde(default)]
    pub default: ClientSettings,
    #[serde(default)]
    pub services: HashMap<String, ClientSettings>,
}

impl ClientsConfig {
    pub fn for_service(&self, service: &str) -> Result<Arc<ClientConfig>> {
        let settings = match self.services.get(service) {
            Some(over) => self.default.overlay(over),
            None => self.default.clone(),
        };
        settings
            .to_config()
            .with_context(|| format!("Invalid client settings for {}", service))
    }
}
