use std::sync::Arc;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::Method,
    middleware, Json, Router,
};
use shared::error::ApiError;
use shared::route::{RouteError, RouteTable};
use shared::types::User;
use crate::config::PatternConfig;
use crate::service::UserService;

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub pattern: Arc<PatternConfig>,
}

pub fn router(state: AppState) -> Result<Router, RouteError> {
    let routes = RouteTable::<AppState>::new()
        .route(Method::GET, "/user/prop", &[], get_prop)?
        .route(Method::GET, "/user/now", &[], get_now)?
        .route(Method::GET, "/user/{id}", &["id"], get_user)?;

    Ok(routes
        .into_router()
        .layer(middleware::from_fn(shared::middleware::request_id))
        .with_state(state))
}

async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<User>, ApiError> {
    let Path(id) = path?;
    state
        .users
        .query_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", id)))
}

async fn get_prop(State(state): State<AppState>) -> Json<PatternConfig> {
    Json(state.pattern.as_ref().clone())
}

async fn get_now(State(state): State<AppState>) -> String {
    chrono::Local::now()
        .format(&state.pattern.dateformat)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use shared::worker::DbWorker;
    use tower::ServiceExt;
    use crate::db::UserDb;

    fn app() -> Router {
        let db = UserDb::open(":memory:").unwrap();
        db.seed_demo_data().unwrap();

        let pattern = PatternConfig {
            dateformat: "%Y".to_string(),
            env_shared_value: "shared".to_string(),
            name: "local".to_string(),
        };

        router(AppState {
            users: UserService::new(DbWorker::spawn("user-db-routes", db).unwrap()),
            pattern: Arc::new(pattern),
        })
        .unwrap()
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let resp = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_get_user() {
        let (status, body) = get(app(), "/user/1").await;
        assert_eq!(status, StatusCode::OK);

        let user: User = serde_json::from_slice(&body).unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_missing_user_is_404() {
        let (status, body) = get(app(), "/user/404").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(err["code"], 404);
    }

    #[tokio::test]
    async fn test_non_positive_id_is_400() {
        let (status, _) = get(app(), "/user/0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get(app(), "/user/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(err["error"], "BAD_REQUEST");
        assert_eq!(err["code"], 400);
    }

    #[tokio::test]
    async fn test_prop_and_now() {
        let (status, body) = get(app(), "/user/prop").await;
        assert_eq!(status, StatusCode::OK);
        let prop: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(prop["envSharedValue"], "shared");
        assert_eq!(prop["dateformat"], "%Y");

        let (status, body) = get(app(), "/user/now").await;
        assert_eq!(status, StatusCode::OK);
        let year = String::from_utf8(body).unwrap();
        assert_eq!(year, chrono::Local::now().format("%Y").to_string());
    }

    #[tokio::test]
    async fn test_response_carries_request_id() {
        let resp = app()
            .oneshot(
                Request::get("/user/2")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.headers()["x-request-id"], "abc-123");
    }
}
