use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;

use crate::error::GatewayError;
use crate::identity::{Caller, guest_cookie};
use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{BatchedRequest, GenerateRequest, GenerateResponse};
use crate::rate_limit::Feature;
use crate::state::AppState;

// POST /api/ai/{feature}
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Path(feature): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<GenerateRequest>,
) -> Response {
    REQUEST_TOTAL.inc();

    let caller = Caller::from_headers(&headers);
    let mut response = match generate(&state, &feature, &caller, payload).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.into_response(),
    };

    if caller.issued_guest {
        if let Ok(cookie) = HeaderValue::from_str(&guest_cookie(&caller.guest_id)) {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
    }
    response
}

async fn generate(
    state: &AppState,
    feature: &str,
    caller: &Caller,
    payload: GenerateRequest,
) -> Result<GenerateResponse, GatewayError> {
    let feature: Feature = feature.parse()?;
    if !feature.is_ai() {
        return Err(GatewayError::NotAiFeature(feature));
    }

    // Admission runs before any upstream work
    let (identity, is_authenticated) = caller.identity_for(feature)?;
    state
        .admission
        .check_admission(identity, is_authenticated, feature.policy())?;

    let start_time = Instant::now();
    let (response_tx, response_rx) = oneshot::channel();

    state
        .batch_tx
        .send(BatchedRequest {
            feature,
            request: payload,
            response_tx,
        })
        .await
        .map_err(|_| GatewayError::QueueClosed)?;

    let result = response_rx.await.map_err(|_| GatewayError::WorkerDropped)?;

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    result
}
