use std::collections::HashSet;
use std::fmt::Display;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use shared::template::PathTemplate;
use crate::error::{RemoteError, SpecError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Fills the placeholder of the same name, or becomes a query parameter
    /// when the path has no such placeholder
    Auto,
    /// Always a query parameter
    Query,
    /// Sent as a request header named after the parameter
    Header,
}

impl ParamKind {
    fn label(self) -> &'static str {
        match self {
            ParamKind::Auto => "auto",
            ParamKind::Query => "query",
            ParamKind::Header => "header",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
}

impl Param {
    pub const fn auto(name: &'static str) -> Self {
        Self { name, kind: ParamKind::Auto }
    }

    pub const fn query(name: &'static str) -> Self {
        Self { name, kind: ParamKind::Query }
    }

    pub const fn header(name: &'static str) -> Self {
        Self { name, kind: ParamKind::Header }
    }
}

/// The HTTP shape of one remote operation
#[derive(Debug, Clone)]
pub struct CallSpec {
    pub name: &'static str,
    pub method: Method,
    pub path: &'static str,
    /// Declared parameters, in the order callers pass arguments
    pub params: &'static [Param],
}

/// An outbound request after argument binding.
/// Interceptors may edit it before it is dispatched.
#[derive(Debug, Clone)]
pub struct RemoteRequest {
    pub service: String,
    pub operation: &'static str,
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub(crate) attempt: u32,
}

impl RemoteRequest {
    /// 1 for the first dispatch, incremented on every retry
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// A call spec whose template has been parsed and checked
#[derive(Debug, Clone)]
pub(crate) struct CheckedSpec {
    pub spec: CallSpec,
    pub template: PathTemplate,
    header_names: Vec<Option<HeaderName>>,
}

impl CallSpec {
    /// Check that every placeholder binds to exactly one declared parameter
    pub(crate) fn check(&self) -> Result<CheckedSpec, SpecError> {
        let operation = self.name.to_string();
        let template = PathTemplate::parse(self.path).map_err(|source| SpecError::Template {
            operation: operation.clone(),
            source,
        })?;

        let mut seen = HashSet::new();
        for param in self.params {
            if !seen.insert(param.name) {
                return Err(SpecError::DuplicateParam {
                    operation,
                    param: param.name.to_string(),
                });
            }
            if param.kind != ParamKind::Auto && template.has_placeholder(param.name) {
                return Err(SpecError::PlaceholderKind {
                    operation,
                    param: param.name.to_string(),
                    kind: param.kind.label(),
                });
            }
        }

        if let Some(placeholder) = template
            .placeholders()
            .find(|p| !self.params.iter().any(|param| param.name == *p))
        {
            return Err(SpecError::UnboundPlaceholder {
                operation,
                placeholder: placeholder.to_string(),
            });
        }

        let header_names = self
            .params
            .iter()
            .map(|param| match param.kind {
                ParamKind::Header => HeaderName::from_bytes(param.name.as_bytes())
                    .map(Some)
                    .map_err(|_| SpecError::InvalidHeaderName {
                        operation: operation.clone(),
                        param: param.name.to_string(),
                    }),
                _ => Ok(None),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CheckedSpec {
            spec: self.clone(),
            template,
            header_names,
        })
    }
}

impl CheckedSpec {
    /// Turn positional arguments into a request for `service`
    pub fn bind(&self, service: &str, args: &[&(dyn Display + Sync)]) -> Result<RemoteRequest, RemoteError> {
        let binding_error = |message: String| RemoteError::Binding {
            operation: self.spec.name.to_string(),
            message,
        };

        if args.len() != self.spec.params.len() {
            return Err(binding_error(format!(
                "expected {} arguments, got {}",
                self.spec.params.len(),
                args.len()
            )));
        }

        let values: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();

        let path = self
            .template
            .expand(|name| {
                self.spec
                    .params
                    .iter()
                    .position(|param| param.name == name)
                    .map(|i| values[i].clone())
            })
            .map_err(|e| binding_error(e.to_string()))?;

        let mut query = Vec::new();
        let mut headers = HeaderMap::new();
        for ((param, value), header_name) in self.spec.params.iter().zip(&values).zip(&self.header_names) {
            match param.kind {
                ParamKind::Auto if self.template.has_placeholder(param.name) => {}
                ParamKind::Auto | ParamKind::Query => {
                    query.push((param.name.to_string(), value.clone()));
                }
                ParamKind::Header => {
                    let header_value = HeaderValue::from_str(value)
                        .map_err(|_| binding_error(format!("invalid value for header {}", param.name)))?;
                    if let Some(name) = header_name {
                        headers.append(name.clone(), header_value);
                    }
                }
            }
        }

        Ok(RemoteRequest {
            service: service.to_string(),
            operation: self.spec.name,
            method: self.spec.method.clone(),
            path,
            query,
            headers,
            attempt: 0,
        })
    }
}
