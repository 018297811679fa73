//! API integration tests for status, health and request validation.
//!
//! Tests verify:
//! - Status and health endpoints
//! - Markdown and LaTeX rendering over HTTP
//! - Error bodies and status codes for bad requests

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use data_formatting::RenderService;

use super::test_utils::render_router;

async fn body_string(response: axum::response::Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(body.into())
        .unwrap()
}

// =============================================================================
// Status & Health
// =============================================================================

#[tokio::test]
async fn test_status_endpoint() {
    for uri in ["/v1/", "/v1"] {
        let router = render_router(RenderService::new());
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json, serde_json::json!({"status": "running"}));
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let router = render_router(RenderService::new());
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let router = render_router(RenderService::new());
    let request = Request::builder()
        .uri("/v2/markdown")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_markdown_requires_post() {
    let router = render_router(RenderService::new());
    let request = Request::builder()
        .uri("/v1/markdown")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// Rendering
// =============================================================================

#[tokio::test]
async fn test_markdown_renders_html() {
    let router = render_router(RenderService::new());

    let response = router
        .oneshot(post("/v1/markdown", "# Title\n\nSome *emphasis*."))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));

    let html = body_string(response).await;
    assert!(html.contains("<h1>Title</h1>"));
    assert!(html.contains("<em>emphasis</em>"));
}

#[tokio::test]
async fn test_latex_renders_html() {
    let router = render_router(RenderService::new());

    let response = router
        .oneshot(post("/v1/latex", r"Euler: $e^{i\pi} + 1 = 0$"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.starts_with("Euler: "));
    assert!(html.contains("katex"));
}

#[tokio::test]
async fn test_empty_body_is_missing_input() {
    for uri in ["/v1/markdown", "/v1/latex"] {
        let router = render_router(RenderService::new());
        let response = router.oneshot(post(uri, Body::empty())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"], "missing_input");
        assert_eq!(json["status"], 400);
    }
}

#[tokio::test]
async fn test_non_utf8_body_is_rejected() {
    let router = render_router(RenderService::new());
    let response = router
        .oneshot(post("/v1/markdown", vec![0xffu8, 0xfe, 0xfd]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["error"], "invalid_encoding");
}

#[tokio::test]
async fn test_invalid_latex_is_server_error() {
    let router = render_router(RenderService::new());
    let response = router
        .oneshot(post("/v1/latex", r"$$\frac{1}{$$"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["error"], "latex_error");
}

// =============================================================================
// Tiling Request Validation
// =============================================================================

#[tokio::test]
async fn test_dzi_request_validation() {
    let cases = [
        ("", "missing_input"),
        ("{}", "missing_input"),
        (r#"{"get_url": ""}"#, "missing_input"),
        ("not json", "invalid_request"),
        (r#"{"get_url": "ftp://example.com/a.png"}"#, "invalid_request"),
    ];

    for (body, error_type) in cases {
        let router = render_router(RenderService::new());
        let response = router.oneshot(post("/v1/dzi", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body:?}");

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"], error_type, "body {body:?}");
    }
}

#[tokio::test]
async fn test_cors_preflight_allows_post() {
    let router = render_router(RenderService::new());
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/v1/markdown")
        .header("origin", "https://example.com")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}
