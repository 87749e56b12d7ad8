//! Output file naming.
//!
//! Every output name is built the same way:
//!
//! ```text
//! prefix + stem + suffix + extension
//!
//! beach.png  (prefix "thumb_", suffix "_800", format jpeg) → thumb_beach_800.jpg
//! scan.tif   (no prefix/suffix, format kept)               → scan.tiff
//! ```
//!
//! The extension always comes from the format actually encoded, never from the
//! source file, so a `.jpeg` source written as JPEG becomes `.jpg`.

use crate::imaging::OutputFormat;
use image::ImageFormat;
use std::path::Path;

/// Prefix and suffix applied around every file stem.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingRule {
    pub prefix: String,
    pub suffix: String,
}

impl NamingRule {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Build the output file name for a source stem encoded as `format`.
    pub fn file_name(&self, stem: &str, format: OutputFormat) -> String {
        format!("{}{}{}{}", self.prefix, stem, self.suffix, format.extension())
    }
}

/// Guess the output format from the source file name, without decoding.
///
/// Used for dry-run listings. The real run trusts the decoded contents
/// instead, so a mislabelled file can end up with a different extension.
pub fn planned_format(source: &Path, requested: Option<OutputFormat>) -> Option<OutputFormat> {
    if requested.is_some() {
        return requested;
    }
    ImageFormat::from_path(source)
        .ok()
        .and_then(OutputFormat::from_image_format)
}
