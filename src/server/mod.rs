//! HTTP server layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │        /v1/  /v1/markdown  /v1/latex  /v1/dzi  /health          │
//! │                                                                 │
//! │  ┌──────────────────────────────┐  ┌─────────────────────────┐  │
//! │  │          handlers            │  │        routes           │  │
//! │  │ (requests, error mapping)    │  │ (router, CORS, tracing) │  │
//! │  └──────────────────────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    dzi_handler, health_handler, latex_handler, markdown_handler, status_handler, AppState,
    DziRequest, ErrorResponse, HealthResponse, StatusResponse, ARCHIVE_FILE_NAME,
};
pub use routes::{create_router, RouterConfig};
