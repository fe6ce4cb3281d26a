//! Rotate stage.

use image::{imageops, Rgb};
use imageproc::geometric_transformations::{self, Interpolation as Sampling};

use crate::error::{Error, Result};
use crate::image::PixelBuffer;

use super::config::Interpolation;

/// Fill for pixels with no source after an arbitrary-angle rotation.
const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

/// Rotate a buffer clockwise by `degrees`.
///
/// Right-angle rotations are exact permutations of the samples; 90 and 270
/// degrees swap width and height. Any other angle rotates about the image
/// center onto a canvas of the same size, sampling with `interpolation` and
/// filling uncovered pixels with black.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `degrees` is not finite.
pub fn rotate(buffer: &PixelBuffer, degrees: f32, interpolation: Interpolation) -> Result<PixelBuffer> {
    if !degrees.is_finite() {
        return Err(Error::invalid_argument(
            "degrees",
            format!("must be finite, got {degrees}"),
        ));
    }

    let src = buffer.samples();
    let rotated = match quarter_turns(degrees) {
        Some(0) => return Ok(buffer.clone()),
        Some(1) => imageops::rotate90(src),
        Some(2) => imageops::rotate180(src),
        Some(3) => imageops::rotate270(src),
        _ => geometric_transformations::rotate(
            src,
            pixel_center(src.width(), src.height()),
            degrees.to_radians(),
            sampling(interpolation),
            BACKGROUND,
        ),
    };

    buffer.with_samples(rotated)
}

/// Number of clockwise quarter turns, when `degrees` is a multiple of 90.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn quarter_turns(degrees: f32) -> Option<u8> {
    let normalized = degrees.rem_euclid(360.0);
    if normalized % 90.0 != 0.0 {
        return None;
    }
    // rem_euclid may round up to exactly 360
    Some((normalized / 90.0) as u8 % 4)
}

/// Center of the pixel grid, with pixel centers at integer indices.
#[allow(clippy::cast_precision_loss)]
fn pixel_center(width: u32, height: u32) -> (f32, f32) {
    ((width - 1) as f32 / 2.0, (height - 1) as f32 / 2.0)
}

const fn sampling(interpolation: Interpolation) -> Sampling {
    match interpolation {
        Interpolation::Nearest => Sampling::Nearest,
        Interpolation::Bilinear => Sampling::Bilinear,
        Interpolation::Bicubic => Sampling::Bicubic,
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, RgbImage};

    use super::*;
    use crate::image::ColorOrder;

    const BLUE: [u8; 3] = [0, 0, 255];
    const RED: [u8; 3] = [255, 0, 0];
    const BLACK: [u8; 3] = [0, 0, 0];

    fn buffer(img: RgbImage) -> PixelBuffer {
        PixelBuffer::from_image(&DynamicImage::ImageRgb8(img), ColorOrder::Rgb).unwrap()
    }

    fn diagonal() -> PixelBuffer {
        buffer(RgbImage::from_fn(2, 2, |x, y| match (x, y) {
            (0, 0) => Rgb(BLUE),
            (1, 1) => Rgb(RED),
            _ => Rgb(BLACK),
        }))
    }

    #[test]
    fn test_rotate_90_moves_corners_clockwise() {
        let out = rotate(&diagonal(), 90.0, Interpolation::Nearest).unwrap();

        assert_eq!(out.get(1, 0), BLUE);
        assert_eq!(out.get(0, 1), RED);
        assert_eq!(out.get(0, 0), BLACK);
        assert_eq!(out.get(1, 1), BLACK);
    }

    #[test]
    fn test_rotate_90_swaps_dimensions() {
        let img = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8, y as u8, 0]));
        let out = rotate(&buffer(img), 90.0, Interpolation::Nearest).unwrap();

        assert_eq!((out.width(), out.height()), (2, 3));
        // source (x, y) lands on (h - 1 - y, x)
        assert_eq!(out.get(1, 0), [0, 0, 0]);
        assert_eq!(out.get(0, 2), [2, 1, 0]);
    }

    #[test]
    fn test_negative_quarter_turn_is_counter_clockwise() {
        let cw = rotate(&diagonal(), 270.0, Interpolation::Nearest).unwrap();
        let ccw = rotate(&diagonal(), -90.0, Interpolation::Nearest).unwrap();
        assert_eq!(cw, ccw);
        assert_eq!(ccw.get(0, 1), BLUE);
    }

    #[test]
    fn test_full_turn_is_identity() {
        let buffer = diagonal();
        assert_eq!(rotate(&buffer, 360.0, Interpolation::Nearest).unwrap(), buffer);
        assert_eq!(rotate(&buffer, -720.0, Interpolation::Bilinear).unwrap(), buffer);
    }

    #[test]
    fn test_four_quarter_turns_round_trip() {
        let img = RgbImage::from_fn(5, 3, |x, y| Rgb([x as u8, y as u8, 7]));
        let original = buffer(img);
        let mut current = original.clone();
        for _ in 0..4 {
            current = rotate(&current, 90.0, Interpolation::Nearest).unwrap();
        }
        assert_eq!(current, original);
    }

    #[test]
    fn test_arbitrary_angle_keeps_canvas_and_fills_black() {
        let white = buffer(RgbImage::from_pixel(5, 5, Rgb([255, 255, 255])));
        let out = rotate(&white, 45.0, Interpolation::Nearest).unwrap();

        assert_eq!((out.width(), out.height()), (5, 5));
        assert_eq!(out.get(0, 0), BLACK);
        assert_eq!(out.get(2, 2), [255, 255, 255]);
    }

    #[test]
    fn test_arbitrary_angle_keeps_center_pixel() {
        let img = RgbImage::from_fn(3, 3, |x, y| Rgb([(y * 3 + x + 1) as u8, 0, 0]));
        let out = rotate(&buffer(img), 45.0, Interpolation::Nearest).unwrap();

        assert_eq!(out.get(1, 1), [5, 0, 0]);
    }

    #[test]
    fn test_single_pixel_survives_any_angle() {
        let single = buffer(RgbImage::from_pixel(1, 1, Rgb([7, 7, 7])));
        for degrees in [45.0, 179.0, 89.999, -33.3] {
            let out = rotate(&single, degrees, Interpolation::Nearest).unwrap();
            assert_eq!(out, single, "{degrees} degrees");
        }
    }

    #[test]
    fn test_near_quarter_turn_matches_exact_path() {
        let img = RgbImage::from_fn(4, 4, |x, y| Rgb([(y * 4 + x) as u8, 0, 0]));
        let exact = rotate(&buffer(img.clone()), 90.0, Interpolation::Nearest).unwrap();
        let near = rotate(&buffer(img), 89.999, Interpolation::Nearest).unwrap();

        assert_eq!(near, exact);
    }

    #[test]
    fn test_pixel_center() {
        assert_eq!(pixel_center(1, 1), (0.0, 0.0));
        assert_eq!(pixel_center(3, 4), (1.0, 1.5));
    }

    #[test]
    fn test_quarter_turns() {
        assert_eq!(quarter_turns(0.0), Some(0));
        assert_eq!(quarter_turns(90.0), Some(1));
        assert_eq!(quarter_turns(-90.0), Some(3));
        assert_eq!(quarter_turns(540.0), Some(2));
        assert_eq!(quarter_turns(45.0), None);
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(rotate(&diagonal(), f32::INFINITY, Interpolation::Nearest).is_err());
    }
}
