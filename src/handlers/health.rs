use axum::{Json, extract::State};
use std::sync::Arc;

use crate::state::AppState;

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let healthy_backends = state
        .load_balancer
        .all_backends()
        .iter()
        .filter(|b| b.is_healthy())
        .count();

    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "tracked_identities": state.admission.tracked_identities(),
        "healthy_backends": healthy_backends,
        "cache_entries": state.cache.len(),
    }))
}
