//! Per-request temporary workspace.
//!
//! ```text
//! <tmp>/dzi-XXXXXX/            TileWorkspace (removed on drop)
//! ├── source-XXXXXX            fetched image bytes
//! └── output/                  generator output root
//!     ├── image.dzi
//!     └── image_files/<level>/<col>_<row>.<ext>
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempDir};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::TilingError;

/// Directory (inside the workspace) the generator writes into.
pub const OUTPUT_DIR_NAME: &str = "output";

/// Basename passed to the generator, giving `image.dzi` and `image_files/`.
pub const PYRAMID_NAME: &str = "image";

/// A file found under the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Absolute path on disk
    pub path: PathBuf,
    /// `/`-separated path relative to the output directory
    pub relative: String,
}

/// Temporary directory owned by exactly one tiling request.
///
/// Everything inside it is deleted when the value is dropped, whichever way
/// the owner exits.
#[derive(Debug)]
pub struct TileWorkspace {
    dir: TempDir,
    output: PathBuf,
}

impl TileWorkspace {
    /// Create a workspace in `parent`, or in the system temp dir if `None`.
    pub fn create(parent: Option<&Path>) -> Result<Self, TilingError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("dzi-");
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(TilingError::workspace)?;

        let output = dir.path().join(OUTPUT_DIR_NAME);
        std::fs::create_dir(&output).map_err(TilingError::workspace)?;

        debug!(path = %dir.path().display(), "Created tile workspace");
        Ok(Self { dir, output })
    }

    /// Root of the workspace.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory the generator writes into.
    pub fn output_dir(&self) -> &Path {
        &self.output
    }

    /// Write the source bytes to a temporary file inside the workspace.
    ///
    /// The file is removed when the returned handle is dropped, and in any
    /// case together with the workspace.
    pub fn write_source(&self, bytes: &[u8]) -> Result<NamedTempFile, TilingError> {
        let mut file = tempfile::Builder::new()
            .prefix("source-")
            .tempfile_in(self.dir.path())
            .map_err(TilingError::workspace)?;
        file.write_all(bytes).map_err(TilingError::workspace)?;
        file.flush().map_err(TilingError::workspace)?;
        Ok(file)
    }

    /// Every regular file under the output directory.
    ///
    /// Directories are not listed. Siblings are visited in file-name order
    /// so identical output always lists identically.
    pub fn output_files(&self) -> Result<Vec<OutputFile>, TilingError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.output).sort_by_file_name() {
            let entry = entry.map_err(TilingError::workspace)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.output)
                .map_err(TilingError::workspace)?
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            files.push(OutputFile {
                path: entry.into_path(),
                relative,
            });
        }

        Ok(files)
    }
}
