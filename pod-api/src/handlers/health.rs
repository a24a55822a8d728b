use axum::Json;
use serde_json::{json, Value};

/// Health check endpoint
///
/// Does not touch the cluster, so it stays green before the first dial.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "pod-api"
    }))
}
