//! Text rendering: Markdown and LaTeX to HTML.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                RenderService                 │
//! │   ┌──────────────────┐ ┌──────────────────┐  │
//! │   │  markdown lock   │ │    latex lock    │  │
//! │   └────────┬─────────┘ └────────┬─────────┘  │
//! └────────────┼────────────────────┼────────────┘
//!              ▼                    ▼
//!     ┌──────────────────┐ ┌──────────────────┐
//!     │ MarkdownRenderer │ │  normalize_latex │
//!     │     (comrak)     │ │  KatexRenderer   │
//!     └──────────────────┘ └──────────────────┘
//! ```

mod latex;
mod markdown;
mod service;

pub use latex::{normalize_latex, KatexRenderer, DISPLAY_DELIMITER};
pub use markdown::MarkdownRenderer;
pub use service::RenderService;

use crate::error::RenderError;

/// A synchronous text-to-HTML renderer.
///
/// Implementations are not assumed to tolerate concurrent calls;
/// [`RenderService`] serializes access to each one.
pub trait TextRenderer: Send + Sync {
    /// Render `text` to an HTML string.
    fn render(&self, text: &str) -> Result<String, RenderError>;
}
