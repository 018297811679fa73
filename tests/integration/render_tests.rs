//! Render serialization tests.
//!
//! Tests verify:
//! - Concurrent Markdown renders never overlap
//! - Markdown and LaTeX renders do not wait on each other

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use data_formatting::RenderService;

use super::test_utils::{render_router, OverlapDetectingRenderer};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_markdown_never_overlaps() {
    let markdown = OverlapDetectingRenderer::new(Duration::from_millis(20));
    let latex = OverlapDetectingRenderer::new(Duration::ZERO);
    let service = RenderService::with_renderers(markdown.clone(), latex);

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.render_markdown(format!("request {i}")).await
        }));
    }

    for handle in handles {
        let html = handle.await.unwrap().unwrap();
        assert!(html.starts_with("<p>request "));
    }

    assert_eq!(markdown.calls(), 8);
    assert!(!markdown.overlapped(), "markdown renders overlapped");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_markdown_requests_over_http() {
    let markdown = OverlapDetectingRenderer::new(Duration::from_millis(10));
    let latex = OverlapDetectingRenderer::new(Duration::ZERO);
    let router = render_router(RenderService::with_renderers(markdown.clone(), latex));

    let mut handles = Vec::new();
    for i in 0..6 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            let request = Request::builder()
                .method("POST")
                .uri("/v1/markdown")
                .body(Body::from(format!("doc {i}")))
                .unwrap();
            router.oneshot(request).await.unwrap().status()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }
    assert_eq!(markdown.calls(), 6);
    assert!(!markdown.overlapped());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_latex_does_not_wait_for_markdown() {
    let markdown = OverlapDetectingRenderer::new(Duration::from_millis(800));
    let latex = OverlapDetectingRenderer::new(Duration::ZERO);
    let service = RenderService::with_renderers(markdown, latex.clone());

    let slow = {
        let service = service.clone();
        tokio::spawn(async move { service.render_markdown("slow".to_string()).await })
    };
    // Let the markdown render take its lock first.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    service.render_latex("$x$".to_string()).await.unwrap();
    assert!(
        started.elapsed() < Duration::from_millis(500),
        "latex render waited on the markdown lock"
    );
    assert_eq!(latex.calls(), 1);

    slow.await.unwrap().unwrap();
}
