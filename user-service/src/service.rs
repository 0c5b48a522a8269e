use shared::error::ApiError;
use shared::types::User;
use shared::worker::DbWorker;
use crate::db::UserDb;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("user id must be positive, got {0}")]
    InvalidId(i64),

    #[error("user store unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::InvalidId(_) => ApiError::BadRequest(e.to_string()),
            UserError::StorageUnavailable(_) => ApiError::Unavailable(e.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct UserService {
    db: DbWorker<UserDb>,
}

impl UserService {
    pub fn new(db: DbWorker<UserDb>) -> Self {
        Self { db }
    }

    /// `Ok(None)` when no user has this id
    pub async fn query_by_id(&self, id: i64) -> Result<Option<User>, UserError> {
        if id <= 0 {
            return Err(UserError::InvalidId(id));
        }

        self.db
            .call(move |db| db.find_by_id(id))
            .await
            .map_err(|e| UserError::StorageUnavailable(e.to_string()))?
            .map_err(|e| UserError::StorageUnavailable(format!("{:#}", e)))
    }
}
