use thiserror::Error;

/// Errors raised by the Markdown and LaTeX renderers.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// Request body was absent or empty
    #[error("Missing input: request body is empty")]
    MissingInput,

    /// Request body is not valid UTF-8
    #[error("Invalid encoding: request body is not valid UTF-8")]
    InvalidEncoding,

    /// Markdown renderer failure
    #[error("Markdown rendering failed: {message}")]
    Markdown { message: String },

    /// LaTeX renderer failure
    #[error("LaTeX rendering failed: {message}")]
    Latex { message: String },

    /// The blocking render task did not complete
    #[error("Render task interrupted: {message}")]
    Interrupted { message: String },
}

/// Errors from fetching a source image over HTTP.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, TLS, timeout, body read)
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// Upstream answered with a non-success status
    #[error("Upstream returned HTTP {status} for {url}")]
    Upstream { url: String, status: u16 },

    /// Upstream body exceeds the configured size limit
    #[error("Source image at {url} exceeds the {limit} byte limit")]
    TooLarge { url: String, limit: u64 },
}

/// Errors from building a Deep Zoom pyramid.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// Source is corrupt or in an unsupported format
    #[error("Failed to decode source image: {message}")]
    Decode { message: String },

    /// Source decoded to an image with a zero dimension
    #[error("Source image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// A tile could not be encoded
    #[error("Failed to encode tile {path}: {message}")]
    Encode { path: String, message: String },

    /// Writing tiles or the descriptor failed
    #[error("I/O error while writing pyramid: {0}")]
    Io(String),

    /// The generator panicked or its task was cancelled
    #[error("Pyramid generation aborted: {message}")]
    Panicked { message: String },
}

impl From<std::io::Error> for GenerationError {
    fn from(err: std::io::Error) -> Self {
        GenerationError::Io(err.to_string())
    }
}

/// Errors from the tiling pipeline as a whole.
#[derive(Debug, Clone, Error)]
pub enum TilingError {
    /// `get_url` was absent or empty
    #[error("Missing input: request must contain a non-empty \"get_url\"")]
    MissingInput,

    /// Body was not valid JSON or `get_url` is not a usable URL
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Fetching the source image failed
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Pyramid generation failed
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Creating, writing or traversing the temporary workspace failed
    #[error("Workspace error: {message}")]
    Workspace { message: String },
}

impl TilingError {
    pub(crate) fn workspace(err: impl std::fmt::Display) -> Self {
        TilingError::Workspace {
            message: err.to_string(),
        }
    }
}
