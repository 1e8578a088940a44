use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use super::AppState;

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.config.snapshot();

    Json(json!({
        "name": "Exam Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Authentication and routing gateway for the exam platform services",
        "routes": snapshot.routes.len(),
        "config_version": snapshot.version,
        "pipeline": state.pipeline.stage_names(),
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.config.snapshot();

    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "config_version": snapshot.version,
        "loaded_at": snapshot.loaded_at,
    }))
}
