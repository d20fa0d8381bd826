#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use upscale_api::config::{ServerConfig, UpscaleConfig};
use upscale_api::router::build_app_router;
use upscale_api::state::AppState;
use upscale_core::storage::StorageLayout;
use upscale_core::upscaler::UpscaleCommand;

/// Copies the upload to the expected output path, like a no-op upscaler.
pub const COPY_SCRIPT: &str = r#"cp "$UPSCALE_INPUT_PATH" "$UPSCALE_OUTPUT_PATH""#;

const BOUNDARY: &str = "upscale-test-boundary";

/// `sh -c <script>` with a short timeout.
pub fn sh(script: &str) -> UpscaleCommand {
    UpscaleCommand::new("sh", vec!["-c".into(), script.into()])
        .with_timeout(Some(Duration::from_secs(10)))
}

/// Build a test `ServerConfig` rooted at `root`.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout and a 1 MiB upload limit.
pub fn test_config(root: &Path, layout: StorageLayout, command: UpscaleCommand) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 1024 * 1024,
        upscale: UpscaleConfig {
            input_dir: root.join("LR"),
            output_dir: root.join("results"),
            layout,
            command,
        },
    }
}

/// Build the full application router with the production middleware stack,
/// launching `command` as the upscaler.
pub fn build_test_app_with(root: &Path, layout: StorageLayout, command: UpscaleCommand) -> Router {
    let config = test_config(root, layout, command);
    let state = AppState::from_config(config.clone());
    build_app_router(state, &config)
}

/// Per-job layout running `script` through `sh -c`.
pub fn build_test_app(root: &Path, script: &str) -> Router {
    build_test_app_with(root, StorageLayout::PerJob, sh(script))
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, method: Method, uri: &str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri).await
}

pub async fn post(app: Router, uri: &str) -> Response {
    send(app, Method::POST, uri).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri).await
}

/// Multipart body with a single part named `field`.
pub fn multipart_body(field: &str, file_name: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn upload_as(app: Router, field: &str, file_name: &str, bytes: &[u8]) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/jobs")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, file_name, bytes)))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST /api/v1/jobs with `bytes` as the `file` field.
pub async fn upload(app: Router, file_name: &str, bytes: &[u8]) -> Response {
    upload_as(app, "file", file_name, bytes).await
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

pub async fn body_bytes(response: Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

/// A small valid PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
