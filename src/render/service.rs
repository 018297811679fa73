//! Lock-guarded entry point for text rendering.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::RenderError;

use super::latex::{normalize_latex, KatexRenderer};
use super::markdown::MarkdownRenderer;
use super::TextRenderer;

type SharedRenderer = Arc<Mutex<Box<dyn TextRenderer>>>;

/// Process-wide rendering service.
///
/// Holds one lock per renderer kind. Markdown requests queue behind each
/// other, LaTeX requests queue behind each other, and the two kinds never
/// wait on one another. The render itself runs on the blocking pool while the
/// lock is held.
#[derive(Clone)]
pub struct RenderService {
    markdown: SharedRenderer,
    latex: SharedRenderer,
}

impl RenderService {
    /// Create the service with the comrak and KaTeX renderers.
    pub fn new() -> Self {
        Self::with_renderers(MarkdownRenderer::new(), KatexRenderer::new())
    }

    /// Create the service with custom renderers.
    pub fn with_renderers(
        markdown: impl TextRenderer + 'static,
        latex: impl TextRenderer + 'static,
    ) -> Self {
        Self {
            markdown: Arc::new(Mutex::new(Box::new(markdown))),
            latex: Arc::new(Mutex::new(Box::new(latex))),
        }
    }

    /// Render Markdown to HTML.
    pub async fn render_markdown(&self, text: String) -> Result<String, RenderError> {
        if text.is_empty() {
            return Err(RenderError::MissingInput);
        }
        run_locked(&self.markdown, "markdown", text).await
    }

    /// Normalize and render LaTeX to HTML.
    ///
    /// See [`normalize_latex`] for the delimiter rewriting applied first.
    pub async fn render_latex(&self, text: String) -> Result<String, RenderError> {
        if text.is_empty() {
            return Err(RenderError::MissingInput);
        }
        let normalized = normalize_latex(&text);
        run_locked(&self.latex, "latex", normalized).await
    }
}

impl Default for RenderService {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_locked(
    renderer: &SharedRenderer,
    kind: &'static str,
    text: String,
) -> Result<String, RenderError> {
    let guard = Arc::clone(renderer).lock_owned().await;
    debug!(kind, input_len = text.len(), "Rendering");

    tokio::task::spawn_blocking(move || guard.render(&text))
        .await
        .map_err(|err| RenderError::Interrupted {
            message: err.to_string(),
        })?
}
