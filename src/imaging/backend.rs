//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: decode and transcode. Neither touches the filesystem; bytes come
//! in, bytes go out, and the batch driver owns all reads and writes.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust and built on the
//! `image` crate's codecs.

use super::params::{ColorMode, OutputFormat, ResizeRequest};
use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use thiserror::Error;

/// Per-image failure raised while decoding, resampling or encoding.
///
/// None of these abort a batch; the driver records them against the source
/// path and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
    #[error("cannot decode image: {0}")]
    Decode(String),
    #[error("no encoder for format: {0}")]
    UnsupportedFormat(String),
    #[error("encoding failed: {0}")]
    Encode(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A decoded raster plus the container format it was read from.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub pixels: DynamicImage,
    /// Format detected from the file contents, if any.
    pub native_format: Option<ImageFormat>,
}

impl SourceImage {
    pub fn new(pixels: DynamicImage, native_format: Option<ImageFormat>) -> Self {
        Self {
            pixels,
            native_format,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.pixels.width(),
            height: self.pixels.height(),
        }
    }

    pub fn color_mode(&self) -> ColorMode {
        self.pixels.color().into()
    }
}

/// Encoded output of one transcode, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcoded {
    pub bytes: Vec<u8>,
    pub dimensions: Dimensions,
    pub format: OutputFormat,
    /// Channel layout actually handed to the encoder.
    pub color_mode: ColorMode,
}

/// Trait for image processing backends.
///
/// Implementations must be stateless with respect to individual images: the
/// batch driver calls them from many worker threads at once.
pub trait ImageBackend: Sync {
    /// Decode raw file bytes into a raster.
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, TranscodeError>;

    /// Resample to `dims`, normalize the color mode for the target format and
    /// encode.
    fn transcode(
        &self,
        image: &SourceImage,
        dims: Dimensions,
        request: &ResizeRequest,
    ) -> Result<Transcoded, TranscodeError>;
}

/// Pick the format to encode with: the requested one, else the source's own,
/// else PNG.
///
/// A source format that this build cannot encode is an error rather than a
/// silent fallback.
pub fn effective_format(
    image: &SourceImage,
    request: &ResizeRequest,
) -> Result<OutputFormat, TranscodeError> {
    if let Some(format) = request.output_format {
        return Ok(format);
    }
    match image.native_format {
        Some(native) => OutputFormat::from_image_format(native)
            .ok_or_else(|| TranscodeError::UnsupportedFormat(format!("{native:?}"))),
        None => Ok(OutputFormat::Png),
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations without doing pixel work.
    ///
    /// Source "images" are ASCII: `WxH` decodes to a blank RGB raster of that
    /// size tagged as PNG, `WxH:rgba` to an RGBA one, anything else is a decode
    /// failure. Keying on content rather than call order keeps it
    /// deterministic under rayon's `par_iter`.
    #[derive(Default)]
    pub struct MockBackend {
        pub operations: Mutex<Vec<RecordedOp>>,
        /// Formats whose transcode should fail with an encode error.
        pub failing_formats: Vec<OutputFormat>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(String),
        Transcode {
            width: u32,
            height: u32,
            format: OutputFormat,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(formats: Vec<OutputFormat>) -> Self {
            Self {
                operations: Mutex::new(Vec::new()),
                failing_formats: formats,
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn transcode_count(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Transcode { .. }))
                .count()
        }
    }

    fn parse_fixture(text: &str) -> Option<(u32, u32, bool)> {
        let (size, alpha) = match text.split_once(':') {
            Some((size, "rgba")) => (size, true),
            Some(_) => return None,
            None => (text, false),
        };
        let (w, h) = size.trim().split_once('x')?;
        Some((w.parse().ok()?, h.parse().ok()?, alpha))
    }

    impl ImageBackend for MockBackend {
        fn decode(&self, bytes: &[u8]) -> Result<SourceImage, TranscodeError> {
            let text = String::from_utf8_lossy(bytes).to_string();
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(text.clone()));

            let (w, h, alpha) = parse_fixture(&text)
                .ok_or_else(|| TranscodeError::Decode(format!("not a mock image: {text:?}")))?;
            let pixels = if alpha {
                DynamicImage::new_rgba8(w, h)
            } else {
                DynamicImage::new_rgb8(w, h)
            };
            Ok(SourceImage::new(pixels, Some(ImageFormat::Png)))
        }

        fn transcode(
            &self,
            image: &SourceImage,
            dims: Dimensions,
            request: &ResizeRequest,
        ) -> Result<Transcoded, TranscodeError> {
            let format = effective_format(image, request)?;
            self.operations.lock().unwrap().push(RecordedOp::Transcode {
                width: dims.width,
                height: dims.height,
                format,
                quality: request.quality.value(),
            });
            if self.failing_formats.contains(&format) {
                return Err(TranscodeError::Encode(format!("mock {format} failure")));
            }
            Ok(Transcoded {
                bytes: format!("{}:{}", format.name(), dims).into_bytes(),
                dimensions: dims,
                format,
                color_mode: image.color_mode(),
            })
        }
    }

    #[test]
    fn mock_decodes_fixture_text() {
        let backend = MockBackend::new();
        let image = backend.decode(b"40x30").unwrap();
        assert_eq!(
            image.dimensions(),
            Dimensions {
                width: 40,
                height: 30
            }
        );
        assert_eq!(image.color_mode(), ColorMode::Rgb);

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Decode("40x30".to_string())]);
    }

    #[test]
    fn mock_rejects_garbage() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.decode(b"\x00\x01garbage"),
            Err(TranscodeError::Decode(_))
        ));
    }

    #[test]
    fn mock_records_transcode() {
        let backend = MockBackend::new();
        let image = backend.decode(b"40x30:rgba").unwrap();
        let request = ResizeRequest {
            width: Some(20),
            output_format: Some(OutputFormat::Jpeg),
            ..ResizeRequest::default()
        };
        let out = backend
            .transcode(
                &image,
                Dimensions {
                    width: 20,
                    height: 15,
                },
                &request,
            )
            .unwrap();
        assert_eq!(out.format, OutputFormat::Jpeg);
        assert!(matches!(
            &backend.get_operations()[1],
            RecordedOp::Transcode {
                width: 20,
                height: 15,
                format: OutputFormat::Jpeg,
                quality: 95,
            }
        ));
    }

    // =========================================================================
    // effective_format
    // =========================================================================

    fn blank(native: Option<ImageFormat>) -> SourceImage {
        SourceImage::new(DynamicImage::new_rgb8(2, 2), native)
    }

    #[test]
    fn requested_format_wins() {
        let request = ResizeRequest {
            output_format: Some(OutputFormat::Webp),
            ..ResizeRequest::default()
        };
        assert_eq!(
            effective_format(&blank(Some(ImageFormat::Jpeg)), &request),
            Ok(OutputFormat::Webp)
        );
    }

    #[test]
    fn native_format_used_when_not_requested() {
        assert_eq!(
            effective_format(&blank(Some(ImageFormat::Jpeg)), &ResizeRequest::default()),
            Ok(OutputFormat::Jpeg)
        );
    }

    #[test]
    fn png_when_nothing_known() {
        assert_eq!(
            effective_format(&blank(None), &ResizeRequest::default()),
            Ok(OutputFormat::Png)
        );
    }

    #[test]
    fn native_format_without_encoder_is_unsupported() {
        assert!(matches!(
            effective_format(&blank(Some(ImageFormat::Ico)), &ResizeRequest::default()),
            Err(TranscodeError::UnsupportedFormat(_))
        ));
    }
}
