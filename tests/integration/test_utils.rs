//! Test utilities for integration tests.
//!
//! This module provides mock fetchers, generators and renderers plus helpers
//! for building routers, fixture images and inspecting zip archives.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use image::{ImageFormat, Rgb, RgbImage};

use data_formatting::error::{FetchError, GenerationError, RenderError};
use data_formatting::tiling::{ImageFetcher, PyramidGenerator, PyramidSummary, TilingService};
use data_formatting::{create_router, RenderService, RouterConfig, TextRenderer};

// =============================================================================
// Mock Fetcher
// =============================================================================

/// A fetcher that serves fixed bytes, or answers 404 when it has none.
#[derive(Clone)]
pub struct MockFetcher {
    body: Option<Bytes>,
    calls: Arc<AtomicUsize>,
}

impl MockFetcher {
    pub fn serving(body: impl Into<Bytes>) -> Self {
        Self {
            body: Some(body.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn not_found() -> Self {
        Self {
            body: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ImageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.body.clone().ok_or_else(|| FetchError::Upstream {
            url: url.to_string(),
            status: 404,
        })
    }
}

// =============================================================================
// Mock Generators
// =============================================================================

/// What a [`MockGenerator`] does when invoked.
#[derive(Clone, Copy)]
pub enum GeneratorBehavior {
    /// Write this many tile files spread over level directories
    Files(usize),
    /// Reject the input
    Fail,
    /// Panic halfway through writing
    Panic,
}

/// A generator that writes a predictable tree and counts invocations.
#[derive(Clone)]
pub struct MockGenerator {
    behavior: GeneratorBehavior,
    calls: Arc<AtomicUsize>,
}

impl MockGenerator {
    pub fn new(behavior: GeneratorBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl PyramidGenerator for MockGenerator {
    fn generate(
        &self,
        source: &Path,
        output_dir: &Path,
        name: &str,
    ) -> Result<PyramidSummary, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(source.is_file(), "source should exist during generation");

        let files_dir = output_dir.join(format!("{name}_files"));
        match self.behavior {
            GeneratorBehavior::Fail => Err(GenerationError::Decode {
                message: "unsupported image".to_string(),
            }),
            GeneratorBehavior::Panic => {
                std::fs::create_dir_all(files_dir.join("0")).unwrap();
                std::fs::write(files_dir.join("0/0_0.jpg"), b"partial").unwrap();
                panic!("generator exploded");
            }
            GeneratorBehavior::Files(count) => {
                for i in 0..count {
                    let level = files_dir.join((i % 3).to_string());
                    std::fs::create_dir_all(&level)?;
                    std::fs::write(level.join(format!("{i}_0.jpg")), format!("tile {i}"))?;
                }
                // An empty directory must not show up in the archive
                std::fs::create_dir_all(files_dir.join("empty"))?;
                Ok(PyramidSummary {
                    width: 1,
                    height: 1,
                    levels: 3,
                    tiles: count,
                })
            }
        }
    }
}

// =============================================================================
// Instrumented Renderer
// =============================================================================

/// A renderer that records whether two calls were ever in flight at once.
#[derive(Clone)]
pub struct OverlapDetectingRenderer {
    active: Arc<AtomicUsize>,
    overlapped: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl OverlapDetectingRenderer {
    pub fn new(delay: Duration) -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            overlapped: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(AtomicUsize::new(0)),
            delay,
        }
    }

    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextRenderer for OverlapDetectingRenderer {
    fn render(&self, text: &str) -> Result<String, RenderError> {
        if self.active.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        std::thread::sleep(self.delay);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(format!("<p>{text}</p>"))
    }
}

// =============================================================================
// Router Helpers
// =============================================================================

/// Build a router around the given tiling parts and the real renderers.
pub fn tiling_router<F: ImageFetcher, G: PyramidGenerator>(
    fetcher: F,
    generator: G,
    workspace_parent: &Path,
) -> Router {
    let tiling = TilingService::new(fetcher, generator).with_workspace_parent(workspace_parent);
    create_router(RenderService::new(), tiling, RouterConfig::new())
}

/// Build a router whose tiling side is never expected to be used.
pub fn render_router(render_service: RenderService) -> Router {
    let tiling = TilingService::new(
        MockFetcher::not_found(),
        MockGenerator::new(GeneratorBehavior::Fail),
    );
    create_router(render_service, tiling, RouterConfig::new().with_tracing(false))
}

/// Serve `router` on an ephemeral loopback port and return its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

// =============================================================================
// Fixtures
// =============================================================================

/// Encode a gradient PNG of the given size.
pub fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Names of all entries in a zip archive, in archive order.
pub fn zip_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    archive.file_names().map(str::to_string).collect()
}

/// Number of entries left in a workspace parent directory.
pub fn workspace_count(parent: &Path) -> usize {
    std::fs::read_dir(parent).unwrap().count()
}

/// Wait until `parent` is empty or a timeout elapses, returning what remains.
///
/// The archive producer drops its workspace on a blocking thread, shortly
/// after the last byte is handed over.
pub async fn wait_for_cleanup(parent: &Path) -> Vec<PathBuf> {
    for _ in 0..100 {
        if workspace_count(parent) == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    std::fs::read_dir(parent)
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.path())
        .collect()
}
