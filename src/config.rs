//! Resize configuration module.
//!
//! Handles loading, merging and validating the options for one batch run.
//! Configuration is layered: stock defaults are overridden by an optional
//! `resize.toml`, which is in turn overridden by command-line flags.
//!
//! ## Config File Location
//!
//! ```text
//! photos/
//! ├── resize.toml              # Picked up automatically (overrides stock defaults)
//! ├── beach.jpg
//! └── sunset.png
//! ```
//!
//! `--config <path>` points at a file elsewhere instead; an explicit path
//! that does not exist is an error.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [resize]
//! # width = 800            # Target width in pixels
//! # height = 600           # Target height in pixels
//! maintain_aspect = true   # Fit inside width x height instead of stretching
//!
//! [output]
//! # format = "jpeg"        # jpeg, png, bmp, webp, tiff, gif (default: keep source format)
//! quality = 95             # JPEG quality (1-100)
//! prefix = ""              # Prepended to every output file name
//! suffix = ""              # Appended to the stem, before the extension
//!
//! [processing]
//! # max_processes = 4      # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! At least one of `width`/`height` must be set by the time all layers are
//! merged. This is checked once, before any image is opened.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{OutputFormat, Quality, ResizeRequest};
use crate::naming::NamingRule;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the input folder.
pub const CONFIG_FILENAME: &str = "resize.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("at least one of --width or --height must be specified")]
    MissingDimension,
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Options for a batch run.
///
/// All fields have defaults except the target size, which must come from a
/// config file or the command line. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    /// Target size and aspect policy.
    pub resize: ResizeSection,
    /// Output format, quality and file naming.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ResizeConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resize.width.is_none() && self.resize.height.is_none() {
            return Err(ConfigError::MissingDimension);
        }
        if self.resize.width == Some(0) || self.resize.height == Some(0) {
            return Err(ConfigError::Validation(
                "resize.width and resize.height must be positive".into(),
            ));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        for (key, value) in [("prefix", &self.output.prefix), ("suffix", &self.output.suffix)] {
            if value.contains(['/', '\\']) {
                return Err(ConfigError::Validation(format!(
                    "output.{key} must not contain path separators"
                )));
            }
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The immutable per-image request shared by every worker.
    pub fn request(&self) -> ResizeRequest {
        ResizeRequest {
            width: self.resize.width,
            height: self.resize.height,
            maintain_aspect: self.resize.maintain_aspect,
            quality: Quality::new(self.output.quality),
            output_format: self.output.format,
        }
    }

    /// Prefix/suffix rule for output file names.
    pub fn naming(&self) -> NamingRule {
        NamingRule::new(&self.output.prefix, &self.output.suffix)
    }
}

/// Target size settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeSection {
    /// Target width in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Target height in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// When both sides are given, fit inside the box instead of stretching.
    pub maintain_aspect: bool,
}

impl Default for ResizeSection {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            maintain_aspect: true,
        }
    }
}

/// Output encoding and naming settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Output format. Absent means keep each source's own format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    /// JPEG encoding quality (1 = worst, 100 = best). Ignored by other formats.
    pub quality: u32,
    /// Prepended to every output file name.
    pub prefix: String,
    /// Appended to the file stem, before the extension.
    pub suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            quality: Quality::default().value(),
            prefix: String::new(),
            suffix: String::new(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Command-line values layered on top of the file config.
///
/// Every field is optional; only the flags the user actually passed end up
/// in the overlay.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    pub resize: ResizeOverrides,
    pub output: OutputOverrides,
    pub processing: ProcessingOverrides,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResizeOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintain_aspect: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OutputOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

impl ConfigOverrides {
    /// Render as a sparse TOML table for [`merge_toml`].
    pub fn to_toml(&self) -> Result<toml::Value, ConfigError> {
        Ok(toml::Value::try_from(self)?)
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ResizeConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn read_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Locate and read the file layer.
///
/// An explicit path must exist. Without one, `resize.toml` in the input
/// folder is used when present; `Ok(None)` otherwise.
pub fn load_raw_config(
    input_dir: &Path,
    explicit: Option<&Path>,
) -> Result<Option<toml::Value>, ConfigError> {
    if let Some(path) = explicit {
        return read_raw_config(path).map(Some);
    }
    let config_path = input_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    read_raw_config(&config_path).map(Some)
}

/// Merge the layers in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    layers: impl IntoIterator<Item = toml::Value>,
) -> Result<ResizeConfig, ConfigError> {
    let merged = layers.into_iter().fold(base, merge_toml);
    let config: ResizeConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the full configuration for a run.
///
/// Stock defaults → config file → command-line overrides. Rejects unknown
/// keys and validates the merged result, so a missing target size is caught
/// here rather than once per image.
pub fn load_config(
    input_dir: &Path,
    explicit: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ResizeConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let file_layer = load_raw_config(input_dir, explicit)?;
    let cli_layer = overrides.to_toml()?;
    resolve_config(base, file_layer.into_iter().chain(Some(cli_layer)))
}

/// Returns a fully-commented stock `resize.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# batch-resize configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as resize.toml in the input folder, or pass --config.
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Target size
# ---------------------------------------------------------------------------
[resize]
# At least one of width/height must be given here or on the command line.
# width = 800
# height = 600

# With both width and height set: true fits the image inside the box and
# keeps its proportions, false stretches to exactly width x height.
maintain_aspect = true

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# One of: jpeg, png, bmp, webp, tiff, gif.
# Omit to keep each image's own format.
# format = "jpeg"

# JPEG quality (1 = worst, 100 = best). Other formats ignore it.
quality = 95

# Output file name = prefix + original name + suffix + extension.
prefix = ""
suffix = ""

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
