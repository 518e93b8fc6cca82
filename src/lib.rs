pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod load_balancer;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod state;
pub mod worker;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::handlers::{generate_handler, health_handler, metrics_handler};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/ai/{feature}", post(generate_handler))
        .with_state(state)
}
