//! HTTP request handlers for the data formatting API.
//!
//! # Endpoints
//!
//! - `GET /v1/` - Liveness status
//! - `POST /v1/markdown` - Render Markdown to HTML
//! - `POST /v1/latex` - Render LaTeX to HTML
//! - `POST /v1/dzi` - Tile a remote image into a Deep Zoom zip archive
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use url::Url;

use crate::error::{FetchError, RenderError, TilingError};
use crate::render::RenderService;
use crate::tiling::{ImageFetcher, PyramidGenerator, TilingService};

/// File name offered to clients for the tile archive.
pub const ARCHIVE_FILE_NAME: &str = "image.zip";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<F: ImageFetcher, G: PyramidGenerator> {
    /// Markdown and LaTeX rendering behind per-kind locks
    pub render_service: RenderService,

    /// Fetch, tile and archive pipeline
    pub tiling_service: Arc<TilingService<F, G>>,
}

impl<F: ImageFetcher, G: PyramidGenerator> AppState<F, G> {
    pub fn new(render_service: RenderService, tiling_service: TilingService<F, G>) -> Self {
        Self {
            render_service,
            tiling_service: Arc::new(tiling_service),
        }
    }
}

impl<F: ImageFetcher, G: PyramidGenerator> Clone for AppState<F, G> {
    fn clone(&self) -> Self {
        Self {
            render_service: self.render_service.clone(),
            tiling_service: Arc::clone(&self.tiling_service),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// JSON body of a tiling request.
#[derive(Debug, Deserialize)]
pub struct DziRequest {
    /// URL of the source image
    #[serde(default)]
    pub get_url: Option<String>,
}

impl DziRequest {
    /// Parse and validate a request body, returning the source URL.
    ///
    /// An empty body or an absent/blank `get_url` is
    /// [`TilingError::MissingInput`]. Malformed JSON and URLs that are not
    /// absolute `http`/`https` URLs are [`TilingError::InvalidRequest`].
    pub fn parse(body: &[u8]) -> Result<String, TilingError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(TilingError::MissingInput);
        }

        let request: DziRequest =
            serde_json::from_slice(body).map_err(|e| TilingError::InvalidRequest {
                message: format!("body is not a valid JSON request: {e}"),
            })?;

        let url = request
            .get_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or(TilingError::MissingInput)?;

        let parsed = Url::parse(&url).map_err(|e| TilingError::InvalidRequest {
            message: format!("get_url is not a valid URL: {e}"),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TilingError::InvalidRequest {
                message: format!("unsupported URL scheme: {}", parsed.scheme()),
            });
        }

        Ok(url)
    }
}

/// Decode a text request body.
fn body_text(body: Bytes) -> Result<String, RenderError> {
    if body.is_empty() {
        return Err(RenderError::MissingInput);
    }
    String::from_utf8(body.to_vec()).map_err(|_| RenderError::InvalidEncoding)
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "missing_input", "upstream_error")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Body of `GET /v1/`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Log an error by severity and turn it into a JSON response.
///
/// - 5xx errors are logged at ERROR level (server and upstream failures)
/// - 4xx errors are logged at WARN level (client errors)
fn error_response(status: StatusCode, error_type: &str, message: String) -> Response {
    if status.is_server_error() {
        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            message
        );
    } else if status.is_client_error() {
        warn!(
            error_type = error_type,
            status = status.as_u16(),
            "Client error: {}",
            message
        );
    }

    let error_response = ErrorResponse::with_status(error_type, message, status);
    (status, Json(error_response)).into_response()
}

impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            RenderError::MissingInput => (StatusCode::BAD_REQUEST, "missing_input"),
            RenderError::InvalidEncoding => (StatusCode::BAD_REQUEST, "invalid_encoding"),
            RenderError::Markdown { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "markdown_error"),
            RenderError::Latex { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "latex_error"),
            RenderError::Interrupted { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "render_interrupted")
            }
        };

        error_response(status, error_type, self.to_string())
    }
}

/// Convert TilingError to HTTP response.
///
/// Anything that went wrong while talking to the source host is reported as
/// 502 Bad Gateway, whatever the upstream status was.
impl IntoResponse for TilingError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            // 400 Bad Request
            TilingError::MissingInput => (StatusCode::BAD_REQUEST, "missing_input"),
            TilingError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "invalid_request"),

            // 502 Bad Gateway
            TilingError::Fetch(fetch_err) => match fetch_err {
                FetchError::Network { .. } => (StatusCode::BAD_GATEWAY, "fetch_error"),
                FetchError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "upstream_error"),
                FetchError::TooLarge { .. } => (StatusCode::BAD_GATEWAY, "source_too_large"),
            },

            // 500 Internal Server Error
            TilingError::Generation(_) => (StatusCode::INTERNAL_SERVER_ERROR, "generation_error"),
            TilingError::Workspace { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "workspace_error"),
        };

        error_response(status, error_type, self.to_string())
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle status requests.
///
/// # Endpoint
///
/// `GET /v1/`
///
/// # Response
///
/// `200 OK` with JSON body `{"status": "running"}`
pub async fn status_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running".to_string(),
    })
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle Markdown rendering requests.
///
/// # Endpoint
///
/// `POST /v1/markdown` with the raw Markdown text as body
///
/// # Response
///
/// - `200 OK`: rendered HTML with `Content-Type: text/html`
/// - `400 Bad Request`: empty or non-UTF-8 body
/// - `500 Internal Server Error`: renderer failure
pub async fn markdown_handler<F: ImageFetcher, G: PyramidGenerator>(
    State(state): State<AppState<F, G>>,
    body: Bytes,
) -> Result<Html<String>, RenderError> {
    let text = body_text(body)?;
    debug!(bytes = text.len(), "Rendering markdown");
    let html = state.render_service.render_markdown(text).await?;
    Ok(Html(html))
}

/// Handle LaTeX rendering requests.
///
/// # Endpoint
///
/// `POST /v1/latex` with the raw LaTeX text as body
///
/// # Response
///
/// Same as [`markdown_handler`].
pub async fn latex_handler<F: ImageFetcher, G: PyramidGenerator>(
    State(state): State<AppState<F, G>>,
    body: Bytes,
) -> Result<Html<String>, RenderError> {
    let text = body_text(body)?;
    debug!(bytes = text.len(), "Rendering latex");
    let html = state.render_service.render_latex(text).await?;
    Ok(Html(html))
}

/// Handle tiling requests.
///
/// # Endpoint
///
/// `POST /v1/dzi` with JSON body `{"get_url": "https://..."}`
///
/// # Response
///
/// - `200 OK`: streamed zip archive with `Content-Type: application/zip`
///   and `Content-Disposition: attachment; filename="image.zip"`
/// - `400 Bad Request`: missing or invalid request
/// - `502 Bad Gateway`: the source image could not be fetched
/// - `500 Internal Server Error`: the image could not be tiled
///
/// Errors that happen after the first byte was sent abort the connection.
pub async fn dzi_handler<F: ImageFetcher, G: PyramidGenerator>(
    State(state): State<AppState<F, G>>,
    body: Bytes,
) -> Result<Response, TilingError> {
    let url = DziRequest::parse(&body)?;
    let stream = state.tiling_service.generate_tiles(&url).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{ARCHIVE_FILE_NAME}\""),
            ),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
