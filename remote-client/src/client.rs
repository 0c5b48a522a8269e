use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use discovery::ServiceRegistry;
use shared::types::ServiceInstance;
use crate::balancer::LoadBalancer;
use crate::config::{ClientConfig, LogLevel};
use crate::error::{RemoteError, SpecError};
use crate::interceptor::Recovery;
use crate::spec::{CallSpec, CheckedSpec, RemoteRequest};
use crate::transport::{RemoteResponse, Transport, TransportError};

/// A declarative client for one logical service
pub struct RemoteClient {
    service: String,
    operations: HashMap<&'static str, Operation>,
}

impl RemoteClient {
    pub fn builder(
        service: impl Into<String>,
        registry: Arc<dyn ServiceRegistry>,
        transport: Arc<dyn Transport>,
    ) -> RemoteClientBuilder {
        RemoteClientBuilder {
            service: service.into(),
            registry,
            transport,
            config: None,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn operation(&self, name: &str) -> Result<Operation, SpecError> {
        self.operations
            .get(name)
            .cloned()
            .ok_or_else(|| SpecError::MissingOperation {
                service: self.service.clone(),
                operation: name.to_string(),
            })
    }

    /// Names of all operations, sorted
    pub fn operation_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.operations.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

pub struct RemoteClientBuilder {
    service: String,
    registry: Arc<dyn ServiceRegistry>,
    transport: Arc<dyn Transport>,
    config: Option<Arc<ClientConfig>>,
}

impl RemoteClientBuilder {
    pub fn config(mut self, config: Arc<ClientConfig>) -> Self {
        self.config = Some(config);
        self
    }

    /// Validate `specs` and create one operation per entry
    pub fn build(self, specs: &[CallSpec]) -> Result<RemoteClient, SpecError> {
        let config = self.config.unwrap_or_default();
        let balancer = config.balancer().build();

        let mut operations = HashMap::new();
        for spec in specs {
            let checked = spec.check()?;
            let operation = Operation {
                inner: Arc::new(OperationInner {
                    service: self.service.clone(),
                    spec: checked,
                    config: config.clone(),
                    registry: self.registry.clone(),
                    balancer: balancer.clone(),
                    transport: self.transport.clone(),
                }),
            };
            if operations.insert(spec.name, operation).is_some() {
                return Err(SpecError::DuplicateOperation(spec.name.to_string()));
            }
        }

        tracing::debug!(
            "Built client for {} with {} operations ({:?})",
            self.service,
            operations.len(),
            config
        );

        Ok(RemoteClient {
            service: self.service,
            operations,
        })
    }
}

/// One callable remote operation. Cheap to clone.
#[derive(Clone)]
pub struct Operation {
    inner: Arc<OperationInner>,
}

struct OperationInner {
    service: String,
    spec: CheckedSpec,
    config: Arc<ClientConfig>,
    registry: Arc<dyn ServiceRegistry>,
    balancer: Arc<dyn LoadBalancer>,
    transport: Arc<dyn Transport>,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        self.inner.spec.spec.name
    }

    /// Bind `args`, dispatch to one instance of the service, and decode the
    /// response. A 404 (or an empty 2xx body) yields `Ok(None)`.
    pub async fn call<T>(&self, args: &[&(dyn Display + Sync)]) -> Result<Option<T>, RemoteError>
    where
        T: DeserializeOwned,
    {
        let inner = &self.inner;
        let mut request = inner.spec.bind(&inner.service, args)?;

        for interceptor in inner.config.interceptors() {
            interceptor.on_request(&mut request);
        }

        loop {
            request.attempt += 1;

            let error = match inner.dispatch(&request).await {
                Ok(response) => {
                    for interceptor in inner.config.interceptors() {
                        interceptor.on_response(&request, &response);
                    }
                    match inner.decode(response) {
                        Ok(value) => return Ok(value),
                        Err(e) => e,
                    }
                }
                Err(e) => e,
            };

            match inner.recover(&request, error) {
                Recovery::Propagate(error) => return Err(error),
                Recovery::Fallback(value) => {
                    return serde_json::from_value(value)
                        .map(Some)
                        .map_err(|e| RemoteError::Decode {
                            service: inner.service.clone(),
                            message: format!("fallback value: {}", e),
                        });
                }
                Recovery::Retry { after } => {
                    if !after.is_zero() {
                        tokio::time::sleep(after).await;
                    }
                }
            }
        }
    }
}

impl OperationInner {
    /// Healthy instances, narrowed to the preferred cluster when it has any
    fn candidates(&self) -> Vec<ServiceInstance> {
        let instances = self.registry.instances(&self.service);
        let Some(cluster) = self.config.preferred_cluster() else {
            return instances;
        };

        let local: Vec<ServiceInstance> = instances
            .iter()
            .filter(|i| i.cluster.as_deref() == Some(cluster))
            .cloned()
            .collect();
        if local.is_empty() {
            if !instances.is_empty() {
                tracing::warn!("No instance of {} in cluster {}, using any cluster", self.service, cluster);
            }
            instances
        } else {
            local
        }
    }

    async fn dispatch(&self, request: &RemoteRequest) -> Result<RemoteResponse, RemoteError> {
        let candidates = self.candidates();
        let target = self
            .balancer
            .choose(&candidates)
            .ok_or_else(|| RemoteError::Unresolvable {
                service: self.service.clone(),
            })?;

        let level = self.config.log_level();
        if level >= LogLevel::Basic {
            tracing::info!(
                "--> {} {}{} ({} attempt {})",
                request.method,
                target.base_url(),
                request.path,
                request.operation,
                request.attempt()
            );
        }
        if level >= LogLevel::Headers {
            tracing::info!("--> headers {:?} query {:?}", request.headers, request.query);
        }

        let started = Instant::now();
        let timeout = self.config.read_timeout();
        let response = self
            .transport
            .send(target, request, timeout)
            .await
            .map_err(|e| match e {
                TransportError::Timeout => RemoteError::Timeout {
                    service: self.service.clone(),
                    target: target.address,
                    timeout,
                },
                TransportError::Connect(message) => RemoteError::Connect {
                    service: self.service.clone(),
                    target: target.address,
                    message,
                },
                TransportError::Other(message) => RemoteError::Transport {
                    service: self.service.clone(),
                    target: target.address,
                    message,
                },
            });

        if level >= LogLevel::Basic {
            match &response {
                Ok(response) => tracing::info!(
                    "<-- {} {}{} ({}ms)",
                    response.status,
                    target.base_url(),
                    request.path,
                    started.elapsed().as_millis()
                ),
                Err(e) => tracing::info!(
                    "<-- ERROR {} ({}ms)",
                    e,
                    started.elapsed().as_millis()
                ),
            }
        }
        if let Ok(response) = &response {
            if level >= LogLevel::Headers {
                tracing::info!("<-- headers {:?}", response.headers);
            }
            if level >= LogLevel::Full {
                tracing::info!("<-- body {}", String::from_utf8_lossy(&response.body));
            }
        }

        response
    }

    fn decode<T: DeserializeOwned>(&self, response: RemoteResponse) -> Result<Option<T>, RemoteError> {
        if response.status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status.is_success() {
            return Err(RemoteError::Status {
                service: self.service.clone(),
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }

        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        serde_json::from_slice(&response.body)
            .map(Some)
            .map_err(|e| RemoteError::Decode {
                service: self.service.clone(),
                message: e.to_string(),
            })
    }

    fn recover(&self, request: &RemoteRequest, error: RemoteError) -> Recovery {
        let mut error = error;
        for interceptor in self.config.interceptors() {
            match interceptor.on_error(request, error) {
                Recovery::Propagate(e) => error = e,
                recovery => return recovery,
            }
        }
        tracing::warn!("{}.{} failed: {}", request.service, request.operation, error);
        Recovery::Propagate(error)
    }
}
