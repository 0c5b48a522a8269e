use std::time::Instant;
use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;
use crate::protocol::REQUEST_ID_HEADER;

/// Give every inbound request an `x-request-id` (keeping the caller's if
/// present), echo it on the response, and log the exchange.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let name = HeaderName::from_static(REQUEST_ID_HEADER);
    let request_id = match req.headers().get(&name) {
        Some(value) => value.clone(),
        None => {
            let value = HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
            req.headers_mut().insert(name.clone(), value.clone());
            value
        }
    };

    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let mut response = next.run(req).await;

    tracing::info!(
        "{} {} - {} - {}ms - {}",
        method,
        uri,
        response.status(),
        start.elapsed().as_millis(),
        request_id.to_str().unwrap_or("-")
    );

    response.headers_mut().insert(name, request_id);
    response
}
