use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::rate_limit::{Feature, RateLimitExceeded, UnknownFeature};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    RateLimited(#[from] RateLimitExceeded),
    #[error(transparent)]
    UnknownFeature(#[from] UnknownFeature),
    #[error("{0} is not served by the AI gateway")]
    NotAiFeature(Feature),
    #[error("sign in required for {0}")]
    Unauthenticated(Feature),
    #[error("failed to queue request")]
    QueueClosed,
    #[error("worker failed to respond")]
    WorkerDropped,
    #[error("no healthy backends available")]
    NoHealthyBackend,
    #[error("upstream request failed: {0}")]
    Upstream(String),
    #[error("at least one backend required")]
    NoBackends,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::UnknownFeature(_) | GatewayError::NotAiFeature(_) => {
                StatusCode::NOT_FOUND
            }
            GatewayError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            GatewayError::NoHealthyBackend | GatewayError::QueueClosed => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::WorkerDropped | GatewayError::NoBackends => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = match &self {
            GatewayError::RateLimited(denied) => Some(denied.retry_after_secs),
            _ => None,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorBody {
            error: self.to_string(),
            retry_after,
        };
        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_maps_to_429_with_retry_after() {
        let response =
            GatewayError::from(RateLimitExceeded { retry_after_secs: 42 }).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            GatewayError::Unauthenticated(Feature::DeleteContent).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::from(UnknownFeature("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::Upstream("boom".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::NoHealthyBackend.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
