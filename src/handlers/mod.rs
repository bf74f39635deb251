mod cache_view;
mod cook;
mod health;
mod metrics;
mod root;

pub use cache_view::cache_view_handler;
pub use cook::cook_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use root::root_handler;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/cook", post(cook_handler))
        .route("/cache-view", get(cache_view_handler)) // debug only
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::kitchen::tests::{FakeGenerator, MUSHROOMS, Script};
    use crate::kitchen::{Kitchen, KitchenSettings};
    use crate::metrics::REQUEST_TOTAL;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let kitchen = Kitchen::new(
            Arc::new(MemoryStore::new()),
            FakeGenerator::new(Script::Reply(MUSHROOMS)),
            KitchenSettings::default(),
        );
        router(Arc::new(AppState { kitchen }))
    }

    async fn get_body(uri: &str) -> (StatusCode, Vec<u8>) {
        let resp = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn root_reports_response_format() {
        let (status, body) = get_body("/").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["response_format"], "extended");
        assert!(json["message"].as_str().unwrap().contains("Hotpot"));
    }

    #[tokio::test]
    async fn health_is_healthy() {
        let (status, body) = get_body("/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn metrics_exposes_cook_counter() {
        REQUEST_TOTAL.inc();
        let (status, body) = get_body("/metrics").await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("hotpot_cook_requests_total"), "{text}");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (status, _) = get_body("/generate").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
