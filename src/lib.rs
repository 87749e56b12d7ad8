//! # Batch Resize
//!
//! Resize and format-convert every image in a folder in one pass.
//!
//! # Architecture
//!
//! ```text
//! config   stock defaults → resize.toml → CLI flags   →  ResizeConfig (validated once)
//! scan     input folder                                →  Vec<ImageSource>
//! process  per image, in parallel:
//!            read → decode → resolve → transcode       →  bytes
//!          single writer: claim name → atomic write    →  BatchSummary
//! ```
//!
//! Each image is handled independently. One broken file is a line in the
//! summary, never the end of the run.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Layered `resize.toml` loading, CLI overrides, validation |
//! | [`scan`] | Lists image files directly inside the input folder |
//! | [`imaging`] | Dimension resolution, alpha flattening, encoding (pure Rust) |
//! | [`naming`] | `prefix + stem + suffix + extension` output names |
//! | [`process`] | Parallel batch driver, atomic writes, failure records |
//! | [`output`] | CLI output formatting for progress, summary and dry runs |
//!
//! # Design Decisions
//!
//! ## Validate Once, Fail Per Image
//!
//! A config without any target size is rejected before a single file is
//! opened. Everything after that point is per-image: decode, encode and I/O
//! errors become [`process::FailureRecord`]s and the batch keeps going.
//!
//! ## The Extension Follows the Encoder
//!
//! Output names take their extension from the format actually written, never
//! from the source. `photo.jpeg` kept as JPEG becomes `photo.jpg`; `scan.tif`
//! becomes `scan.tiff`.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling and encoding go through the `image` crate,
//! with `jpeg-encoder` writing JPEGs with optimized Huffman tables. No
//! ImageMagick, no system libraries; the binary is self-contained.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
