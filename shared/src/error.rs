//! JSON error responses shared by the HTTP services

use axum::{
    extract::rejection::PathRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// A dependency (database, downstream service) cannot be reached
    Unavailable(String),
    /// A downstream service answered with something unusable
    BadGateway(String),
    GatewayTimeout(String),
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
    pub timestamp: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Lets handlers take `Result<Path<T>, PathRejection>` and answer a malformed
/// path parameter with the JSON error body
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        if rejection.status().is_client_error() {
            ApiError::BadRequest(rejection.body_text())
        } else {
            ApiError::Internal(rejection.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, message) = match self {
            ApiError::BadRequest(msg) => ("BAD_REQUEST", msg),
            ApiError::NotFound(msg) => ("NOT_FOUND", msg),
            ApiError::Unavailable(msg) => ("SERVICE_UNAVAILABLE", msg),
            ApiError::BadGateway(msg) => ("BAD_GATEWAY", msg),
            ApiError::GatewayTimeout(msg) => ("GATEWAY_TIMEOUT", msg),
            ApiError::Internal(msg) => ("INTERNAL_SERVER_ERROR", msg),
        };

        if status.is_server_error() {
            tracing::error!("{} {}: {}", status.as_u16(), error, message);
        }

        let body = ErrorResponse {
            error: error.to_string(),
            message,
            code: status.as_u16(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}
