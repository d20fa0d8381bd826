//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_bytes, body_json, get, COPY_SCRIPT};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Test: GET /health returns 200 with expected JSON fields
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("LR")).unwrap();
    std::fs::create_dir_all(dir.path().join("results")).unwrap();
    let app = common::build_test_app(dir.path(), COPY_SCRIPT);
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["storage_ready"], true);
    assert_eq!(json["layout"], "per-job");
}

#[tokio::test]
async fn health_check_does_not_touch_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path(), COPY_SCRIPT);
    let json = body_json(get(app, "/health").await).await;

    assert_eq!(json["status"], "degraded");
    assert_eq!(json["storage_ready"], false);
    assert!(!dir.path().join("LR").exists());
    assert!(!dir.path().join("results").exists());
}

#[tokio::test]
async fn health_check_reports_degraded_storage() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the input directory should be.
    std::fs::write(dir.path().join("LR"), b"not a directory").unwrap();

    let app = common::build_test_app(dir.path(), COPY_SCRIPT);
    let json = body_json(get(app, "/health").await).await;

    assert_eq!(json["status"], "degraded");
    assert_eq!(json["storage_ready"], false);
}

// ---------------------------------------------------------------------------
// Test: GET / serves the UI page
// ---------------------------------------------------------------------------

#[tokio::test]
async fn index_page_is_html() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path(), COPY_SCRIPT);
    let response = get(app, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"), "got {content_type}");

    let html = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
    assert!(html.contains("Image Upscaler"));
    assert!(html.contains("accept=\"image/png, image/jpeg\""));
}

// ---------------------------------------------------------------------------
// Test: Unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path(), COPY_SCRIPT);
    let response = get(app, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: x-request-id header is present in response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path(), COPY_SCRIPT);
    let response = get(app, "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");

    // The value should be a valid UUID (36 chars with hyphens).
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

// ---------------------------------------------------------------------------
// Test: CORS preflight OPTIONS request returns correct headers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cors_preflight_returns_correct_headers() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path(), COPY_SCRIPT);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/jobs")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(
        headers["access-control-allow-origin"].to_str().unwrap(),
        "http://localhost:5173"
    );
    let allow_methods = headers["access-control-allow-methods"].to_str().unwrap();
    assert!(
        allow_methods.contains("POST"),
        "Allow-Methods should contain POST, got: {allow_methods}"
    );
}
