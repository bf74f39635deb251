use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use std::sync::Arc;
use tracing::info;
use crate::error::CookError;
use crate::metrics::REQUEST_TOTAL;
use crate::models::{CookRequest, CookResponse};
use crate::prompt::render_ingredient;
use crate::state::AppState;

pub async fn cook_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CookRequest>, JsonRejection>,
) -> Result<Json<CookResponse>, CookError> {
    REQUEST_TOTAL.inc();
    // body rejections surface as 400 {"detail": ...}
    let Json(payload) = payload.map_err(|rejection| CookError::Validation(rejection.body_text()))?;

    let ingredients = payload
        .ingredients
        .iter()
        .map(render_ingredient)
        .collect::<Vec<_>>()
        .join(", ");
    info!(
        %ingredients,
        method = %payload.method,
        effect = payload.method_effect.as_deref().unwrap_or("none"),
        "cook request"
    );

    let dish = state.kitchen.cook(&payload).await?;
    Ok(Json(CookResponse::cooked(dish)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::handlers::router;
    use crate::kitchen::tests::{FakeGenerator, MUSHROOMS, Script};
    use crate::kitchen::{Kitchen, KitchenSettings};
    use crate::models::Dish;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use std::collections::BTreeMap;
    use tower::ServiceExt;

    fn make_app(script: Script, settings: KitchenSettings) -> axum::Router {
        let kitchen = Kitchen::new(
            Arc::new(MemoryStore::new()),
            FakeGenerator::new(script),
            settings,
        );
        router(Arc::new(AppState { kitchen }))
    }

    fn cook_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/cook")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn flour() -> Value {
        json!({
            "ingredients": [{ "name": "flour", "quantity": 500, "unit": "g" }],
            "method": "knead",
            "method_effect": "until smooth"
        })
    }

    #[tokio::test]
    async fn cook_then_cache_hit() {
        let app = make_app(Script::Reply(MUSHROOMS), KitchenSettings::default());

        let resp = app.clone().oneshot(cook_request(flour())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let first = body_json(resp).await;
        assert_eq!(first["success"], true);
        assert_eq!(first["dish"]["name"], "Sauteed Mushrooms");
        assert_eq!(first["dish"]["quality"], "Good");
        assert_eq!(first["dish"]["is_new_discovery"], true);

        let second = body_json(app.clone().oneshot(cook_request(flour())).await.unwrap()).await;
        assert_eq!(second["dish"]["is_new_discovery"], false);
        assert_eq!(second["dish"]["name"], first["dish"]["name"]);

        let view = app
            .oneshot(Request::builder().uri("/cache-view").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(view.into_body(), usize::MAX).await.unwrap();
        let cache: BTreeMap<String, Dish> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.keys().next().unwrap().ends_with("|knead|until smooth"));
    }

    #[tokio::test]
    async fn empty_ingredients_is_bad_request() {
        let app = make_app(Script::Reply(MUSHROOMS), KitchenSettings::default());
        let resp = app
            .oneshot(cook_request(json!({ "ingredients": [], "method": "mix" })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await["detail"].as_str().unwrap().contains("ingredient"));
    }

    #[tokio::test]
    async fn missing_method_is_bad_request() {
        let app = make_app(Script::Reply(MUSHROOMS), KitchenSettings::default());
        let resp = app
            .oneshot(cook_request(json!({
                "ingredients": [{ "name": "egg", "quantity": 1, "unit": "pc" }]
            })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_ingredients_field_is_bad_request() {
        let app = make_app(Script::Reply(MUSHROOMS), KitchenSettings::default());
        let resp = app
            .oneshot(cook_request(json!({ "method": "mix" })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await["detail"].as_str().unwrap().contains("ingredient"));
    }

    #[tokio::test]
    async fn ingredient_without_quantity_is_bad_request() {
        let app = make_app(Script::Reply(MUSHROOMS), KitchenSettings::default());
        let resp = app
            .oneshot(cook_request(json!({
                "ingredients": [{ "name": "egg", "unit": "pc" }],
                "method": "mix"
            })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let detail = body_json(resp).await["detail"].as_str().unwrap().to_string();
        assert!(detail.contains("quantity"), "{detail}");
    }

    #[tokio::test]
    async fn generator_failure_is_server_error() {
        let app = make_app(Script::Fail, KitchenSettings::default());
        let resp = app.oneshot(cook_request(flour())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(resp).await["detail"],
            "Internal server error during cooking."
        );
    }

    #[tokio::test]
    async fn blocked_generation_reports_failed_cook() {
        let app = make_app(
            Script::Blocked,
            KitchenSettings {
                serve_unavailable_placeholder: false,
                ..Default::default()
            },
        );
        let resp = app.oneshot(cook_request(flour())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body.get("dish").is_none());
    }
}
