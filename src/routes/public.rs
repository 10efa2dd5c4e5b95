use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/health", get(health))
}

async fn landing() -> Json<Value> {
    Json(json!({ "message": "Welcome to the carpool API" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
