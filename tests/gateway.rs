use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use std::time::Duration;
use tower::ServiceExt;

use studyai_gateway::rate_limit::{AdmissionController, RateLimitPolicy};
use studyai_gateway::router;
use studyai_gateway::state::AppState;

// Nothing listens on the discard port, so admitted requests fail upstream
// quickly while denials never reach the backend.
const DEAD_BACKEND: &str = "127.0.0.1:9";

fn test_router() -> Router {
    let admission = AdmissionController::in_memory(RateLimitPolicy::default());
    let state = AppState::start(DEAD_BACKEND, Duration::from_secs(30), admission).unwrap();
    router(state)
}

fn generate(feature: &str, cookie: Option<&str>, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/api/ai/{}", feature))
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder
        .body(Body::from(r#"{"model":"llama3","prompt":"Explain mitosis"}"#))
        .unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_tracked_identities() {
    let app = test_router();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["tracked_identities"], 0);
    assert_eq!(body["cache_entries"], 0);
    assert_eq!(body["healthy_backends"], 1);
}

#[tokio::test]
async fn unknown_and_non_ai_features_are_not_found() {
    let app = test_router();

    let response = app
        .clone()
        .oneshot(generate("teleport", Some("studyai_guest=g-1"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(generate("login", Some("studyai_guest=g-1"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn exceeding_feature_quota_returns_429() {
    let app = test_router();
    let cookie = Some("studyai_guest=guest-42");

    // generate-flashcards allows 3 per two minutes
    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(generate("generate-flashcards", cookie, None))
            .await
            .unwrap();
        assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    let response = app
        .clone()
        .oneshot(generate("generate-flashcards", cookie, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()[header::RETRY_AFTER], "120");

    let body = json_body(response).await;
    assert_eq!(body["retry_after"], 120);
    assert_eq!(
        body["error"],
        "Too many requests. Please try again in 120 seconds."
    );

    // the lockout covers every feature for this identity
    let response = app
        .oneshot(generate("summarize", cookie, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn signed_in_user_does_not_inherit_guest_lockout() {
    let app = test_router();
    let cookie = Some("studyai_guest=abc");

    for _ in 0..4 {
        let _ = app
            .clone()
            .oneshot(generate("generate-questions", cookie, None))
            .await
            .unwrap();
    }
    let response = app
        .clone()
        .oneshot(generate("generate-questions", cookie, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = app
        .oneshot(generate("generate-questions", cookie, Some("abc")))
        .await
        .unwrap();
    assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn new_guest_receives_cookie() {
    let app = test_router();

    let response = app
        .oneshot(generate("rephrase", None, None))
        .await
        .unwrap();
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("studyai_guest="));
    assert!(cookie.contains("Max-Age=31536000"));
}

#[tokio::test]
async fn metrics_exposes_admission_counters() {
    let app = test_router();
    let _ = app
        .clone()
        .oneshot(generate("chat", Some("studyai_guest=m-1"), None))
        .await
        .unwrap();

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("studyai_admissions_allowed_total"));
}
