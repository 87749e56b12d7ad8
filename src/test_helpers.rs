//! Shared test utilities: synthetic image files and output-folder assertions.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_png(&tmp.path().join("wide.png"), 400, 200);
//! write_transparent_png(&tmp.path().join("clear.png"), 64, 64);
//!
//! // ... run a batch ...
//!
//! assert_eq!(read_dimensions(&out.join("wide.png")), (200, 100));
//! assert_eq!(listing(&out), vec!["clear.png", "wide.png"]);
//! ```

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;

/// Write an opaque RGB gradient in any format the `image` crate can encode.
pub fn write_rgb(path: &Path, width: u32, height: u32, format: ImageFormat) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    img.save_with_format(path, format).unwrap();
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    write_rgb(path, width, height, ImageFormat::Png);
}

pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    write_rgb(path, width, height, ImageFormat::Jpeg);
}

/// Write a fully transparent RGBA PNG.
pub fn write_transparent_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 0]));
    img.save_with_format(path, ImageFormat::Png).unwrap();
}

/// Decode a written image and return its `(width, height)`.
pub fn read_dimensions(path: &Path) -> (u32, u32) {
    let img = image::open(path).unwrap();
    (img.width(), img.height())
}

/// Sorted file names inside `dir`, hidden files included.
pub fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
