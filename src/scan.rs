//! Input folder scanning.
//!
//! Collects the image files sitting directly inside the input folder. Nothing
//! is opened or decoded here; the filter is by extension only, so a file with
//! an image extension but broken contents is still listed and fails later as
//! a per-image decode error.
//!
//! ```text
//! photos/
//! ├── resize.toml        # skipped (config, not an image)
//! ├── beach.JPG          # listed (extensions are case-insensitive)
//! ├── notes.txt          # skipped
//! ├── scan.tif           # listed
//! └── old/               # skipped (no recursion)
//!     └── trip.png
//! ```
//!
//! Results are sorted by file name so runs are reproducible. An entry that
//! cannot be inspected (a dangling symlink, a permission error) is logged and
//! left out; only an unreadable input folder stops the scan.

use crate::imaging::supported_input_extensions;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("input folder does not exist: {0}")]
    NotFound(PathBuf),
    #[error("input path is not a folder: {0}")]
    NotADirectory(PathBuf),
    #[error("failed to read input folder {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// One image file found in the input folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub path: PathBuf,
    /// File name including extension, e.g. `beach.JPG`.
    pub file_name: String,
    /// File name without the final extension, e.g. `beach`.
    pub stem: String,
}

impl ImageSource {
    fn from_path(path: PathBuf) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let stem = path.file_stem()?.to_string_lossy().into_owned();
        Some(Self {
            path,
            file_name,
            stem,
        })
    }
}

/// List the images directly inside `input_dir`, sorted by file name.
pub fn scan(input_dir: &Path) -> Result<Vec<ImageSource>, ScanError> {
    if !input_dir.exists() {
        return Err(ScanError::NotFound(input_dir.to_path_buf()));
    }
    if !input_dir.is_dir() {
        return Err(ScanError::NotADirectory(input_dir.to_path_buf()));
    }

    let extensions = supported_input_extensions();
    let mut images = Vec::new();

    for entry in WalkDir::new(input_dir)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            // Depth 0 is the folder itself: nothing in it can be listed.
            Err(source) if source.depth() == 0 => {
                return Err(ScanError::Walk {
                    path: input_dir.to_path_buf(),
                    source,
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry in input folder");
                continue;
            }
        };

        if entry.file_type().is_file() && has_extension(entry.path(), &extensions) {
            images.extend(ImageSource::from_path(entry.into_path()));
        }
    }

    tracing::debug!(folder = %input_dir.display(), found = images.len(), "scanned input folder");
    Ok(images)
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| allowed.contains(&ext.as_str()))
}
