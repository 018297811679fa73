//! Markdown to HTML via comrak.

use comrak::{markdown_to_html, Options};

use crate::error::RenderError;

use super::TextRenderer;

/// Comrak-backed Markdown renderer.
///
/// GFM tables, strikethrough and autolinks are enabled. Raw HTML in the
/// source is passed through unchanged.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options<'static>,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let mut options = Options::default();

        let ext = &mut options.extension;
        ext.table = true;
        ext.strikethrough = true;
        ext.autolink = true;

        options.render.unsafe_ = true;

        Self { options }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRenderer for MarkdownRenderer {
    fn render(&self, text: &str) -> Result<String, RenderError> {
        Ok(markdown_to_html(text, &self.options))
    }
}
