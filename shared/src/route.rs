use axum::{
    handler::Handler,
    http::Method,
    routing::{on, MethodFilter},
    Router,
};
use crate::template::{PathTemplate, TemplateError};

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("route {method} {template} declares parameter {param:?} with no matching placeholder")]
    UnknownParam {
        method: Method,
        template: String,
        param: String,
    },

    #[error("route {method} {template} does not declare placeholder {{{placeholder}}}")]
    UndeclaredPlaceholder {
        method: Method,
        template: String,
        placeholder: String,
    },

    #[error("duplicate route {method} {template}")]
    Duplicate { method: Method, template: String },

    #[error("no method filter for {0}")]
    UnsupportedMethod(Method),
}

#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub method: Method,
    pub template: PathTemplate,
}

/// An ordered (verb, path template) -> handler table.
/// Each entry is checked when it is added: the declared path parameters must
/// match the template's placeholders one-to-one, and no (verb, template) pair
/// may appear twice.
pub struct RouteTable<S = ()> {
    entries: Vec<RouteEntry>,
    router: Router<S>,
}

impl<S> RouteTable<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            router: Router::new(),
        }
    }

    pub fn route<H, T>(
        mut self,
        method: Method,
        template: &str,
        params: &[&str],
        handler: H,
    ) -> Result<Self, RouteError>
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let template = PathTemplate::parse(template)?;

        if let Some(param) = params.iter().find(|p| !template.has_placeholder(p)) {
            return Err(RouteError::UnknownParam {
                method,
                template: template.to_string(),
                param: param.to_string(),
            });
        }

        if let Some(placeholder) = template.placeholders().find(|p| !params.contains(p)) {
            return Err(RouteError::UndeclaredPlaceholder {
                method: method.clone(),
                template: template.to_string(),
                placeholder: placeholder.to_string(),
            });
        }

        let axum_path = template.axum_path();
        if self
            .entries
            .iter()
            .any(|e| e.method == method && e.template.axum_path() == axum_path)
        {
            return Err(RouteError::Duplicate {
                method,
                template: template.to_string(),
            });
        }

        let filter = MethodFilter::try_from(method.clone())
            .map_err(|_| RouteError::UnsupportedMethod(method.clone()))?;

        self.router = self.router.route(&axum_path, on(filter, handler));
        self.entries.push(RouteEntry { method, template });
        Ok(self)
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn into_router(self) -> Router<S> {
        for entry in &self.entries {
            tracing::debug!("Route {} {}", entry.method, entry.template);
        }
        self.router
    }
}

impl<S> Default for RouteTable<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
