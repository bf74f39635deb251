use axum::{Json, extract::State, response::IntoResponse};
use std::sync::Arc;
use crate::state::AppState;

pub async fn root_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Welcome to the Hotpot kitchen! Now with quantities and macros!",
        "response_format": state.kitchen.settings().format,
    }))
}
