//! LaTeX to HTML via KaTeX.
//!
//! Input goes through [`normalize_latex`] first, which rewrites delimiters so
//! that every formula is `$$`-delimited, then [`KatexRenderer`] renders each
//! `$$...$$` segment in display mode and HTML-escapes the text between them.

use katex::{OptsBuilder, OutputType};

use crate::error::RenderError;

use super::TextRenderer;

/// Display-math delimiter expected by the renderer.
pub const DISPLAY_DELIMITER: &str = "$$";

/// Rewrite LaTeX input before rendering.
///
/// Applied in order, as plain substring replacements:
/// 1. every `\displaystyle ` is removed;
/// 2. every `\\` collapses to `\`;
/// 3. if no `$$` remains anywhere, every `$` becomes `$$`.
///
/// Step 3 does not look at LaTeX structure. A lone `$` used as a literal is
/// turned into a delimiter as well.
pub fn normalize_latex(input: &str) -> String {
    let text = input.replace("\\displaystyle ", "").replace("\\\\", "\\");

    if text.contains(DISPLAY_DELIMITER) {
        text
    } else {
        text.replace('$', DISPLAY_DELIMITER)
    }
}

/// KaTeX-backed renderer for `$$`-delimited LaTeX.
///
/// KaTeX keeps one JavaScript engine per thread, so calls are cheap after the
/// first one on a given thread.
#[derive(Debug, Clone, Default)]
pub struct KatexRenderer;

impl KatexRenderer {
    pub fn new() -> Self {
        Self
    }

    fn render_formula(&self, literal: &str) -> Result<String, RenderError> {
        let mut builder = OptsBuilder::default();
        builder.display_mode(true);
        builder.output_type(OutputType::Html);

        let opts = builder.build().map_err(|err| RenderError::Latex {
            message: format!("failed to build KaTeX options: {err}"),
        })?;

        katex::render_with_opts(literal, opts).map_err(|err| RenderError::Latex {
            message: format!("KaTeX rendering failed: {err}"),
        })
    }
}

impl TextRenderer for KatexRenderer {
    fn render(&self, text: &str) -> Result<String, RenderError> {
        let segments: Vec<&str> = text.split(DISPLAY_DELIMITER).collect();
        let last = segments.len() - 1;
        // An even segment count means the final `$$` was never closed.
        let unterminated = segments.len() % 2 == 0;

        let mut html = String::with_capacity(text.len() * 4);
        for (index, segment) in segments.iter().enumerate() {
            let is_math = index % 2 == 1;
            if is_math && unterminated && index == last {
                html.push_str(DISPLAY_DELIMITER);
                push_escaped(&mut html, segment);
            } else if is_math {
                html.push_str(&self.render_formula(segment)?);
            } else {
                push_escaped(&mut html, segment);
            }
        }

        Ok(html)
    }
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}
