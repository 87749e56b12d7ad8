//! Image processing: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Resolve** | [`resolve_dimensions`] (pure arithmetic) |
//! | **Decode** | `image::ImageReader` with format sniffing |
//! | **Resize** | Lanczos3 via `DynamicImage::resize_exact` |
//! | **Encode** | `image` codecs: JPEG, PNG, BMP, WebP, TIFF, GIF |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing the requested output
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{
    Dimensions, ImageBackend, SourceImage, TranscodeError, Transcoded, effective_format,
};
pub use calculations::{ResolveError, resolve_dimensions};
pub use params::{ColorMode, OutputFormat, Quality, ResizeRequest};
pub use rust_backend::{RustBackend, supported_input_extensions};
