use axum::{
    extract::{rejection::PathRejection, Path, Request, State},
    http::Method,
    middleware::{self, Next},
    response::Response,
    Json, Router,
};
use shared::error::ApiError;
use shared::route::{RouteError, RouteTable};
use shared::types::Order;
use crate::service::OrderService;

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
}

pub fn router(state: AppState) -> Result<Router, RouteError> {
    let routes = RouteTable::<AppState>::new()
        .route(Method::GET, "/order/{orderId}", &["orderId"], get_order)?;

    // request_id is outermost so the scope below sees the assigned id
    Ok(routes
        .into_router()
        .layer(middleware::from_fn(inbound_scope))
        .layer(middleware::from_fn(shared::middleware::request_id))
        .with_state(state))
}

/// Expose the inbound headers to outbound calls made while handling the request
async fn inbound_scope(req: Request, next: Next) -> Response {
    let headers = req.headers().clone();
    remote_client::context::scope(headers, next.run(req)).await
}

async fn get_order(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Order>, ApiError> {
    let Path(order_id) = path?;
    state
        .orders
        .query_order_by_id(order_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("order {} not found", order_id)))
}
