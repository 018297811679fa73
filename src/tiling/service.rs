//! Tiling pipeline: fetch, generate, traverse, stream.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         generate_tiles()                         │
//! │                                                                  │
//! │  1. fetch source ──► 2. workspace + source file ──► 3. generate  │
//! │                                                        │         │
//! │  6. stream_zip ◄── 5. read entries lazily ◄── 4. list files      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 1-4 finish before a stream is returned, so their failures surface as
//! an error response. Steps 5-6 run while the body is being sent.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use std::vec;

use tracing::{debug, info};

use crate::error::{GenerationError, TilingError};

use super::archive::{stream_zip, TileEntry, ZipStream};
use super::fetch::ImageFetcher;
use super::pyramid::PyramidGenerator;
use super::workspace::{OutputFile, TileWorkspace, PYRAMID_NAME};

/// Orchestrates a tiling request.
///
/// # Type Parameters
///
/// * `F` - where source images come from
/// * `G` - how the pyramid is built
pub struct TilingService<F: ImageFetcher, G: PyramidGenerator> {
    fetcher: Arc<F>,
    generator: Arc<G>,
    workspace_parent: Option<PathBuf>,
}

impl<F: ImageFetcher, G: PyramidGenerator> TilingService<F, G> {
    /// Create a service using the system temp dir for workspaces.
    pub fn new(fetcher: F, generator: G) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            generator: Arc::new(generator),
            workspace_parent: None,
        }
    }

    /// Create workspaces under `parent` instead of the system temp dir.
    pub fn with_workspace_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.workspace_parent = Some(parent.into());
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Fetch `source_url`, build its Deep Zoom pyramid and stream it as zip.
    ///
    /// The workspace is removed before this returns on error, otherwise once
    /// the returned stream has been fully produced or dropped.
    ///
    /// # Errors
    ///
    /// - [`TilingError::MissingInput`] if `source_url` is blank
    /// - [`TilingError::Fetch`] if the source could not be retrieved
    /// - [`TilingError::Generation`] if the source was not a usable image
    /// - [`TilingError::Workspace`] on local filesystem failures
    pub async fn generate_tiles(&self, source_url: &str) -> Result<ZipStream, TilingError> {
        if source_url.trim().is_empty() {
            return Err(TilingError::MissingInput);
        }

        let started = Instant::now();
        let bytes = self.fetcher.fetch(source_url).await?;
        let fetched_bytes = bytes.len();

        let generator = Arc::clone(&self.generator);
        let parent = self.workspace_parent.clone();
        let (workspace, files) = tokio::task::spawn_blocking(move || {
            let workspace = TileWorkspace::create(parent.as_deref())?;
            let source = workspace.write_source(&bytes)?;
            drop(bytes);

            let summary =
                generator.generate(source.path(), workspace.output_dir(), PYRAMID_NAME)?;
            drop(source);
            debug!(
                levels = summary.levels,
                tiles = summary.tiles,
                "Pyramid generated"
            );

            let files = workspace.output_files()?;
            Ok::<_, TilingError>((workspace, files))
        })
        .await
        .map_err(|e| GenerationError::Panicked {
            message: e.to_string(),
        })??;

        info!(
            url = source_url,
            source_bytes = fetched_bytes,
            entries = files.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Streaming tile archive"
        );

        Ok(stream_zip(TileEntries {
            files: files.into_iter(),
            workspace,
        }))
    }
}

/// Reads output files one at a time and owns the workspace they live in.
struct TileEntries {
    files: vec::IntoIter<OutputFile>,
    workspace: TileWorkspace,
}

impl Iterator for TileEntries {
    type Item = io::Result<TileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let file = self.files.next()?;
        Some(std::fs::read(&file.path).map(|content| TileEntry::new(file.relative, content)))
    }
}

impl Drop for TileEntries {
    fn drop(&mut self) {
        debug!(path = %self.workspace.path().display(), "Releasing tile workspace");
    }
}
