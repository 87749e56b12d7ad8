//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, BMP, GIF, TIFF, WebP) | `image::ImageReader` with content sniffing |
//! | Resample | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Flatten alpha → white | per-pixel composite over an `RgbImage` |
//! | Encode → JPEG | `jpeg_encoder::Encoder` at the requested quality, optimized Huffman tables |
//! | Encode → everything else | `DynamicImage::write_to` with default encoder settings |
//!
//! ## Color-mode normalization
//!
//! JPEG has no alpha channel. Anything with transparency is composited over
//! solid white before encoding, so fully transparent pixels come out white
//! rather than whatever color the transparent pixels happened to store.
//! Formats with alpha keep the channel layout; only the sample depth is
//! narrowed where an encoder accepts 8-bit samples only.

use super::backend::{
    Dimensions, ImageBackend, SourceImage, TranscodeError, Transcoded, effective_format,
};
use super::params::{ColorMode, OutputFormat, Quality, ResizeRequest};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// File extensions the batch picks up, lowercase and without the dot.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("bmp", ImageFormat::Bmp),
    ("gif", ImageFormat::Gif),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

/// Returns the image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> Vec<&'static str> {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode bytes, detecting the container from its magic number.
fn decode_bytes(bytes: &[u8]) -> Result<SourceImage, TranscodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| TranscodeError::Decode(e.to_string()))?;
    let native_format = reader.format();
    let pixels = reader
        .decode()
        .map_err(|e| TranscodeError::Decode(e.to_string()))?;
    Ok(SourceImage::new(pixels, native_format))
}

/// Composite any alpha channel over solid white, producing opaque RGB.
pub(crate) fn flatten_onto_white(img: &DynamicImage) -> DynamicImage {
    let rgba = img.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in rgb.pixels_mut().zip(rgba.pixels()) {
        let alpha = src[3] as u32;
        for c in 0..3 {
            let blended = src[c] as u32 * alpha + 255 * (255 - alpha);
            dst[c] = ((blended + 127) / 255) as u8;
        }
    }
    DynamicImage::ImageRgb8(rgb)
}

/// Same channel layout, 8 bits per sample.
fn to_eight_bit(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => img,
        other => match ColorMode::from(other.color()) {
            ColorMode::Grayscale => DynamicImage::ImageLuma8(other.to_luma8()),
            ColorMode::GrayscaleAlpha => DynamicImage::ImageLumaA8(other.to_luma_alpha8()),
            ColorMode::Rgb => DynamicImage::ImageRgb8(other.to_rgb8()),
            ColorMode::Rgba => DynamicImage::ImageRgba8(other.to_rgba8()),
        },
    }
}

/// Adjust the color mode so the target encoder accepts the raster.
///
/// Only JPEG changes the channel layout (alpha is flattened onto white).
/// For the rest, alpha presence is preserved and sample depth is adjusted to
/// what each encoder supports.
pub(crate) fn normalize_for_format(img: DynamicImage, format: OutputFormat) -> DynamicImage {
    let mode = ColorMode::from(img.color());
    match format {
        OutputFormat::Jpeg if mode.needs_flattening() => flatten_onto_white(&img),
        OutputFormat::Jpeg | OutputFormat::Bmp | OutputFormat::Webp => to_eight_bit(img),
        OutputFormat::Gif => match mode {
            ColorMode::Rgba | ColorMode::GrayscaleAlpha => {
                DynamicImage::ImageRgba8(img.to_rgba8())
            }
            _ => DynamicImage::ImageRgb8(img.to_rgb8()),
        },
        OutputFormat::Tiff => match img {
            DynamicImage::ImageLumaA8(_) => DynamicImage::ImageRgba8(img.to_rgba8()),
            DynamicImage::ImageLumaA16(_) => DynamicImage::ImageRgba16(img.to_rgba16()),
            DynamicImage::ImageRgb32F(_) => DynamicImage::ImageRgb16(img.to_rgb16()),
            DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgba16(img.to_rgba16()),
            other => other,
        },
        OutputFormat::Png => match img {
            DynamicImage::ImageRgb32F(_) => DynamicImage::ImageRgb16(img.to_rgb16()),
            DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgba16(img.to_rgba16()),
            other => other,
        },
    }
}

/// Baseline JPEG at `quality`. Optimized Huffman tables cost a second pass
/// over the coefficients and shrink the file without touching a pixel.
fn encode_jpeg(
    img: &DynamicImage,
    quality: Quality,
    optimize_huffman: bool,
) -> Result<Vec<u8>, TranscodeError> {
    let side = |value: u32| {
        u16::try_from(value).map_err(|_| {
            TranscodeError::Encode(format!(
                "jpeg encode failed: {value} px exceeds the format's 65535 px limit"
            ))
        })
    };
    let (width, height) = (side(img.width())?, side(img.height())?);

    let mut buf = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut buf, quality.value() as u8);
    encoder.set_optimized_huffman_tables(optimize_huffman);
    let written = match img {
        DynamicImage::ImageLuma8(gray) => {
            encoder.encode(gray.as_raw(), width, height, jpeg_encoder::ColorType::Luma)
        }
        other => encoder.encode(
            other.to_rgb8().as_raw(),
            width,
            height,
            jpeg_encoder::ColorType::Rgb,
        ),
    };
    written.map_err(|e| TranscodeError::Encode(format!("jpeg encode failed: {e}")))?;
    Ok(buf)
}

/// Encode to an in-memory buffer.
///
/// JPEG honors `quality`; every other encoder runs with its defaults.
fn encode(
    img: &DynamicImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>, TranscodeError> {
    if !format.image_format().writing_enabled() {
        return Err(TranscodeError::UnsupportedFormat(format.name().to_string()));
    }

    if format == OutputFormat::Jpeg {
        return encode_jpeg(img, quality, true);
    }

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format.image_format())
        .map_err(|e| TranscodeError::Encode(format!("{} encode failed: {e}", format.name())))?;
    Ok(buf.into_inner())
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, TranscodeError> {
        decode_bytes(bytes)
    }

    fn transcode(
        &self,
        image: &SourceImage,
        dims: Dimensions,
        request: &ResizeRequest,
    ) -> Result<Transcoded, TranscodeError> {
        if dims.width == 0 || dims.height == 0 {
            return Err(TranscodeError::Encode(format!(
                "refusing to produce a zero-area image ({dims})"
            )));
        }
        let format = effective_format(image, request)?;

        let resized = image
            .pixels
            .resize_exact(dims.width, dims.height, FilterType::Lanczos3);
        let normalized = normalize_for_format(resized, format);
        let color_mode = ColorMode::from(normalized.color());
        debug!(
            from = %image.dimensions(),
            to = %dims,
            %format,
            ?color_mode,
            "transcoding"
        );

        let bytes = encode(&normalized, format, request.quality)?;
        Ok(Transcoded {
            bytes,
            dimensions: dims,
            format,
            color_mode,
        })
    }
}
