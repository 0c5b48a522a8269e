use std::sync::Arc;
use reqwest::Method;
use discovery::ServiceRegistry;
use shared::protocol::USER_SERVICE;
use shared::types::User;
use crate::client::{Operation, RemoteClient};
use crate::config::ClientConfig;
use crate::error::{RemoteError, SpecError};
use crate::spec::{CallSpec, Param};
use crate::transport::Transport;

/// Operations user-service exposes to other services
pub const USER_CLIENT_SPECS: &[CallSpec] = &[CallSpec {
    name: "findById",
    method: Method::GET,
    path: "/user/{id}",
    params: &[Param::auto("id")],
}];

/// Typed client for user-service
#[derive(Clone)]
pub struct UserClient {
    find_by_id: Operation,
}

impl UserClient {
    pub fn new(
        registry: Arc<dyn ServiceRegistry>,
        transport: Arc<dyn Transport>,
        config: Arc<ClientConfig>,
    ) -> Result<Self, SpecError> {
        let client = RemoteClient::builder(USER_SERVICE, registry, transport)
            .config(config)
            .build(USER_CLIENT_SPECS)?;

        Ok(Self {
            find_by_id: client.operation("findById")?,
        })
    }

    /// `GET /user/{id}`; `Ok(None)` when the user does not exist
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, RemoteError> {
        self.find_by_id.call(&[&id]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use discovery::InMemoryRegistry;
    use crate::testing::{instance, MockTransport};

    #[tokio::test]
    async fn test_find_by_id() {
        let registry = Arc::new(InMemoryRegistry::with_instances([instance("user-1", 8081)]));
        let transport = Arc::new(MockTransport::new());
        transport
            .respond(StatusCode::OK, r#"{"id":110,"username":"alice","address":"Hangzhou"}"#)
            .respond(StatusCode::NOT_FOUND, "");

        let client = UserClient::new(registry, transport.clone(), ClientConfig::builder().build()).unwrap();

        let user = client.find_by_id(110).await.unwrap().unwrap();
        assert_eq!(
            user,
            User {
                id: 110,
                username: "alice".into(),
                address: "Hangzhou".into(),
            }
        );
        assert!(client.find_by_id(999).await.unwrap().is_none());

        let paths: Vec<_> = transport.calls().into_iter().map(|(_, r)| r.path).collect();
        assert_eq!(paths, vec!["/user/110", "/user/999"]);
    }
}
