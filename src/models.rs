use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::GatewayError;
use crate::rate_limit::Feature;

// Generation request, forwarded as-is to the backend's /api/generate
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default)]
    pub stream: bool,
}

// Backend response
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GenerateResponse {
    pub model: String,
    pub response: String,
}

// Admitted request waiting for the worker, with its reply channel
pub struct BatchedRequest {
    pub feature: Feature,
    pub request: GenerateRequest,
    pub response_tx: oneshot::Sender<Result<GenerateResponse, GatewayError>>,
}
