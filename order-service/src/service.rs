use remote_client::{RemoteError, UserClient};
use shared::error::ApiError;
use shared::types::Order;
use shared::worker::DbWorker;
use crate::db::OrderDb;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("order id must be positive, got {0}")]
    InvalidId(i64),

    #[error("order store unavailable: {0}")]
    StorageUnavailable(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        let message = e.to_string();
        match e {
            OrderError::InvalidId(_) => ApiError::BadRequest(message),
            OrderError::StorageUnavailable(_) => ApiError::Unavailable(message),
            OrderError::Remote(remote) => match remote {
                RemoteError::Unresolvable { .. } => ApiError::Unavailable(message),
                RemoteError::Timeout { .. } => ApiError::GatewayTimeout(message),
                RemoteError::Binding { .. } => ApiError::Internal(message),
                RemoteError::Connect { .. }
                | RemoteError::Status { .. }
                | RemoteError::Transport { .. }
                | RemoteError::Decode { .. } => ApiError::BadGateway(message),
            },
        }
    }
}

#[derive(Clone)]
pub struct OrderService {
    db: DbWorker<OrderDb>,
    users: UserClient,
}

impl OrderService {
    pub fn new(db: DbWorker<OrderDb>, users: UserClient) -> Self {
        Self { db, users }
    }

    /// Load the order and attach its user from user-service.
    /// `Ok(None)` when the order does not exist; `user` stays empty when
    /// user-service does not know the user.
    pub async fn query_order_by_id(&self, id: i64) -> Result<Option<Order>, OrderError> {
        if id <= 0 {
            return Err(OrderError::InvalidId(id));
        }

        let order = self
            .db
            .call(move |db| db.find_by_id(id))
            .await
            .map_err(|e| OrderError::StorageUnavailable(e.to_string()))?
            .map_err(|e| OrderError::StorageUnavailable(format!("{:#}", e)))?;

        let Some(mut order) = order else {
            return Ok(None);
        };

        order.user = self.users.find_by_id(order.user_id).await?;
        if order.user.is_none() {
            tracing::warn!("Order {} references unknown user {}", order.id, order.user_id);
        }

        Ok(Some(order))
    }
}
