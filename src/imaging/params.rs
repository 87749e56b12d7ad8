//! Parameter types for image operations.
//!
//! These types describe *what* to produce, not *how*. They are the interface
//! between the batch driver (which builds one [`ResizeRequest`] from the
//! validated config) and the [`backend`](super::backend) (which does the pixel
//! work). The same request is shared read-only by every image in a run.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 95). Clamped on construction.
//! - [`OutputFormat`]: The encodable formats and their file extensions.
//! - [`ColorMode`]: Channel layout of a decoded or resampled raster.
//! - [`ResizeRequest`]: Target box, aspect policy, quality and format override.

use image::{ColorType, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
///
/// Only [`Quality::new`] builds one, so the value is always in range:
///
/// ```compile_fail
/// let out_of_range = batch_resize::imaging::Quality(0);
/// ```
///
/// ```
/// use batch_resize::imaging::Quality;
/// assert_eq!(Quality::new(0).value(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Image formats this tool can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[serde(alias = "jpg", alias = "JPEG", alias = "JPG")]
    #[value(alias = "jpg")]
    Jpeg,
    #[serde(alias = "PNG")]
    Png,
    #[serde(alias = "BMP")]
    Bmp,
    #[serde(alias = "WEBP")]
    Webp,
    #[serde(alias = "tif", alias = "TIFF")]
    #[value(alias = "tif")]
    Tiff,
    #[serde(alias = "GIF")]
    Gif,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 6] = [
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::Bmp,
        OutputFormat::Webp,
        OutputFormat::Tiff,
        OutputFormat::Gif,
    ];

    /// Uppercase display name (`JPEG`, `PNG`, ...).
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Png => "PNG",
            OutputFormat::Bmp => "BMP",
            OutputFormat::Webp => "WEBP",
            OutputFormat::Tiff => "TIFF",
            OutputFormat::Gif => "GIF",
        }
    }

    /// File extension including the leading dot.
    ///
    /// JPEG maps to `.jpg`; every other format is its lowercase name.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => ".jpg",
            OutputFormat::Png => ".png",
            OutputFormat::Bmp => ".bmp",
            OutputFormat::Webp => ".webp",
            OutputFormat::Tiff => ".tiff",
            OutputFormat::Gif => ".gif",
        }
    }

    /// Whether the format can store an alpha channel.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, OutputFormat::Jpeg)
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Bmp => ImageFormat::Bmp,
            OutputFormat::Webp => ImageFormat::WebP,
            OutputFormat::Tiff => ImageFormat::Tiff,
            OutputFormat::Gif => ImageFormat::Gif,
        }
    }

    /// Map a decoder-reported format back to an encodable one.
    ///
    /// Returns `None` for formats this tool has no encoder for.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
            ImageFormat::Png => Some(OutputFormat::Png),
            ImageFormat::Bmp => Some(OutputFormat::Bmp),
            ImageFormat::WebP => Some(OutputFormat::Webp),
            ImageFormat::Tiff => Some(OutputFormat::Tiff),
            ImageFormat::Gif => Some(OutputFormat::Gif),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "bmp" => Ok(OutputFormat::Bmp),
            "webp" => Ok(OutputFormat::Webp),
            "tiff" | "tif" => Ok(OutputFormat::Tiff),
            "gif" => Ok(OutputFormat::Gif),
            other => Err(format!("unsupported output format: {other}")),
        }
    }
}

/// Channel layout of a raster.
///
/// There is no indexed variant: the decoders expand palettes to RGB, or to
/// RGBA when the palette carries transparency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorMode {
    Grayscale,
    GrayscaleAlpha,
    Rgb,
    Rgba,
}

impl ColorMode {
    /// Whether compositing onto an opaque background is needed before writing
    /// to a format without alpha.
    pub fn needs_flattening(self) -> bool {
        matches!(self, ColorMode::GrayscaleAlpha | ColorMode::Rgba)
    }
}

impl From<ColorType> for ColorMode {
    fn from(color: ColorType) -> Self {
        match color {
            ColorType::L8 | ColorType::L16 => ColorMode::Grayscale,
            ColorType::La8 | ColorType::La16 => ColorMode::GrayscaleAlpha,
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => ColorMode::Rgb,
            _ => ColorMode::Rgba,
        }
    }
}

/// Everything the resolver and transcoder need to know about the target.
///
/// Built once per run from the validated config and shared by every image.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeRequest {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub maintain_aspect: bool,
    pub quality: Quality,
    /// `None` keeps the source's own format.
    pub output_format: Option<OutputFormat>,
}

impl Default for ResizeRequest {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            maintain_aspect: true,
            quality: Quality::default(),
            output_format: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_95() {
        assert_eq!(Quality::default().value(), 95);
    }

    #[test]
    fn jpeg_extension_is_jpg() {
        assert_eq!(OutputFormat::Jpeg.extension(), ".jpg");
        assert_eq!(OutputFormat::Webp.extension(), ".webp");
        assert_eq!(OutputFormat::Tiff.extension(), ".tiff");
    }

    #[test]
    fn parse_format_is_case_insensitive_with_aliases() {
        assert_eq!("JPG".parse::<OutputFormat>(), Ok(OutputFormat::Jpeg));
        assert_eq!("jpeg".parse::<OutputFormat>(), Ok(OutputFormat::Jpeg));
        assert_eq!("Tif".parse::<OutputFormat>(), Ok(OutputFormat::Tiff));
        assert_eq!("WEBP".parse::<OutputFormat>(), Ok(OutputFormat::Webp));
        assert!("heic".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn image_format_roundtrips_for_every_output_format() {
        for format in OutputFormat::ALL {
            assert_eq!(
                OutputFormat::from_image_format(format.image_format()),
                Some(format)
            );
        }
    }

    #[test]
    fn unknown_image_format_has_no_encoder() {
        assert_eq!(OutputFormat::from_image_format(ImageFormat::Ico), None);
    }

    #[test]
    fn only_jpeg_lacks_alpha() {
        for format in OutputFormat::ALL {
            assert_eq!(format.supports_alpha(), format != OutputFormat::Jpeg);
        }
    }

    #[test]
    fn color_mode_from_color_type() {
        assert_eq!(ColorMode::from(ColorType::L8), ColorMode::Grayscale);
        assert_eq!(ColorMode::from(ColorType::La16), ColorMode::GrayscaleAlpha);
        assert_eq!(ColorMode::from(ColorType::Rgb16), ColorMode::Rgb);
        assert_eq!(ColorMode::from(ColorType::Rgba8), ColorMode::Rgba);
    }

    #[test]
    fn flattening_needed_only_with_alpha() {
        assert!(ColorMode::Rgba.needs_flattening());
        assert!(ColorMode::GrayscaleAlpha.needs_flattening());
        assert!(!ColorMode::Rgb.needs_flattening());
        assert!(!ColorMode::Grayscale.needs_flattening());
    }

    #[test]
    fn default_request_keeps_aspect() {
        let request = ResizeRequest::default();
        assert!(request.maintain_aspect);
        assert_eq!(request.quality.value(), 95);
        assert!(request.output_format.is_none());
    }
}
