use axum::{Json, extract::State};
use std::collections::BTreeMap;
use std::sync::Arc;
use crate::models::Dish;
use crate::state::AppState;

// Debug dump of every cached dish, keyed by canonical key. Not for production traffic.
pub async fn cache_view_handler(State(state): State<Arc<AppState>>) -> Json<BTreeMap<String, Dish>> {
    Json(state.kitchen.store().snapshot().await)
}
