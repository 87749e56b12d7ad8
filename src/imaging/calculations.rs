//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use super::params::ResizeRequest;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("at least one of width or height must be specified")]
    MissingDimension,
}

/// Resolve the target pixel dimensions for one image.
///
/// Rules, in priority order:
/// 1. Both width and height, aspect not kept → exactly `(W, H)`.
/// 2. Both, aspect kept → fit inside the `W × H` box. Whichever side binds is
///    taken as-is, the other is truncated from the floating-point aspect ratio.
/// 3. Width only → `(W, floor(W * h / w))`.
/// 4. Height only → `(floor(H * w / h), H)`.
/// 5. Neither → [`ResolveError::MissingDimension`].
///
/// Computed sides that truncate to zero are clamped to 1 pixel.
///
/// # Examples
/// ```
/// # use batch_resize::imaging::{Dimensions, ResizeRequest, resolve_dimensions};
/// let request = ResizeRequest { width: Some(800), ..ResizeRequest::default() };
/// let dims = resolve_dimensions(Dimensions { width: 1600, height: 900 }, &request).unwrap();
/// assert_eq!((dims.width, dims.height), (800, 450));
/// ```
pub fn resolve_dimensions(
    original: Dimensions,
    request: &ResizeRequest,
) -> Result<Dimensions, ResolveError> {
    let (width, height) = match (request.width, request.height) {
        (Some(w), Some(h)) if !request.maintain_aspect => (w, h),
        (Some(w), Some(h)) => fit_within(original, w, h),
        (Some(w), None) => (w, scale_side(w, original.height, original.width)),
        (None, Some(h)) => (scale_side(h, original.width, original.height), h),
        (None, None) => return Err(ResolveError::MissingDimension),
    };

    Ok(Dimensions {
        width: width.max(1),
        height: height.max(1),
    })
}

/// Fit the original aspect ratio inside a `target_w × target_h` box.
fn fit_within(original: Dimensions, target_w: u32, target_h: u32) -> (u32, u32) {
    let aspect = original.width as f64 / original.height as f64;
    let requested = target_w as f64 / target_h as f64;

    if requested > aspect {
        // Box is wider than the image: height binds
        (truncate(target_h as f64 * aspect), target_h)
    } else {
        // Box is taller (or identical): width binds
        (target_w, truncate(target_w as f64 / aspect))
    }
}

/// `floor(target * numerator / denominator)` in exact integer arithmetic.
fn scale_side(target: u32, numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return 0;
    }
    let scaled = target as u64 * numerator as u64 / denominator as u64;
    scaled.min(u32::MAX as u64) as u32
}

/// Truncate toward zero, saturating at the `u32` range.
fn truncate(value: f64) -> u32 {
    value as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    fn request(width: Option<u32>, height: Option<u32>, maintain_aspect: bool) -> ResizeRequest {
        ResizeRequest {
            width,
            height,
            maintain_aspect,
            ..ResizeRequest::default()
        }
    }

    fn resolve(original: (u32, u32), req: ResizeRequest) -> (u32, u32) {
        let d = resolve_dimensions(dims(original.0, original.1), &req).unwrap();
        (d.width, d.height)
    }

    // =========================================================================
    // Single-side requests
    // =========================================================================

    #[test]
    fn width_only_landscape() {
        assert_eq!(resolve((1600, 900), request(Some(800), None, true)), (800, 450));
    }

    #[test]
    fn width_only_truncates() {
        // 100 * 333 / 1000 = 33.3 → 33
        assert_eq!(resolve((1000, 333), request(Some(100), None, true)), (100, 33));
    }

    #[test]
    fn height_only_portrait() {
        // 600 * 1080 / 1920 = 337.5 → 337
        assert_eq!(resolve((1080, 1920), request(None, Some(600), true)), (337, 600));
    }

    #[test]
    fn single_side_ignores_aspect_flag() {
        assert_eq!(
            resolve((1600, 900), request(Some(800), None, false)),
            (800, 450)
        );
    }

    #[test]
    fn width_only_upscales() {
        assert_eq!(resolve((100, 50), request(Some(400), None, true)), (400, 200));
    }

    // =========================================================================
    // Box requests
    // =========================================================================

    #[test]
    fn box_without_aspect_is_exact() {
        assert_eq!(
            resolve((500, 500), request(Some(1920), Some(1080), false)),
            (1920, 1080)
        );
    }

    #[test]
    fn box_width_binds_for_wide_source() {
        // aspect 2.0, requested 800/1080 ≈ 0.74 < 2.0 → width binds
        assert_eq!(
            resolve((1000, 500), request(Some(800), Some(1080), true)),
            (800, 400)
        );
    }

    #[test]
    fn box_height_binds_for_tall_source() {
        // aspect 0.5, requested 800/600 ≈ 1.33 > 0.5 → height binds, 600 * 0.5
        assert_eq!(
            resolve((500, 1000), request(Some(800), Some(600), true)),
            (300, 600)
        );
    }

    #[test]
    fn box_matching_aspect_uses_both() {
        assert_eq!(
            resolve((1920, 1080), request(Some(1280), Some(720), true)),
            (1280, 720)
        );
    }

    #[test]
    fn box_result_never_exceeds_either_side() {
        let sources = [(1, 1), (7, 3), (3, 7), (1920, 1080), (1080, 1920), (4000, 17)];
        let boxes = [(1, 1), (100, 100), (640, 480), (333, 999), (1920, 1080)];
        for &(sw, sh) in &sources {
            for &(bw, bh) in &boxes {
                let (w, h) = resolve((sw, sh), request(Some(bw), Some(bh), true));
                assert!(w <= bw && h <= bh, "{sw}x{sh} into {bw}x{bh} gave {w}x{h}");
                assert!(w == bw || h == bh, "{sw}x{sh} into {bw}x{bh} gave {w}x{h}");
            }
        }
    }

    // =========================================================================
    // Edge cases
    // =========================================================================

    #[test]
    fn already_sized_image_is_unchanged() {
        assert_eq!(
            resolve((800, 450), request(Some(800), Some(450), true)),
            (800, 450)
        );
        assert_eq!(resolve((800, 450), request(Some(800), None, true)), (800, 450));
    }

    #[test]
    fn degenerate_side_clamps_to_one() {
        // 10 * 1 / 5000 = 0.002 → 0 → clamped
        assert_eq!(resolve((5000, 1), request(Some(10), None, true)), (10, 1));
        assert_eq!(resolve((1, 5000), request(None, Some(10), true)), (1, 10));
        assert_eq!(
            resolve((5000, 1), request(Some(10), Some(10), true)),
            (10, 1)
        );
    }

    #[test]
    fn missing_dimension_is_an_error() {
        let result = resolve_dimensions(dims(100, 100), &request(None, None, true));
        assert_eq!(result, Err(ResolveError::MissingDimension));
    }
}
