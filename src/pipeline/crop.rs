//! Crop stage.

use image::imageops;

use crate::error::{Error, Result};
use crate::image::PixelBuffer;

/// Remove `left`, `right`, `top` and `bottom` pixels from the buffer edges.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the margins leave no pixels on
/// either axis.
pub fn crop(buffer: &PixelBuffer, left: u32, right: u32, top: u32, bottom: u32) -> Result<PixelBuffer> {
    let width = remaining(buffer.width(), left, right, "width")?;
    let height = remaining(buffer.height(), top, bottom, "height")?;

    let cropped = imageops::crop_imm(buffer.samples(), left, top, width, height).to_image();
    buffer.with_samples(cropped)
}

/// Size left on one axis after removing both margins.
pub(crate) fn remaining(size: u32, start: u32, end: u32, axis: &str) -> Result<u32> {
    let removed = u64::from(start) + u64::from(end);
    if removed >= u64::from(size) {
        return Err(Error::invalid_argument(
            "crop",
            format!("margins {start}+{end} leave no pixels of {axis} {size}"),
        ));
    }
    // removed < size, so it fits in u32
    Ok(size - (start + end))
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, Rgb, RgbImage};

    use super::*;
    use crate::image::ColorOrder;

    fn grid(width: u32, height: u32) -> PixelBuffer {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 0]));
        PixelBuffer::from_image(&DynamicImage::ImageRgb8(img), ColorOrder::Rgb).unwrap()
    }

    #[test]
    fn test_crop_keeps_top_right_pixel() {
        let out = crop(&grid(2, 2), 1, 0, 0, 1).unwrap();

        assert_eq!((out.width(), out.height()), (1, 1));
        assert_eq!(out.get(0, 0), [1, 0, 0]);
    }

    #[test]
    fn test_crop_output_dimensions() {
        for (l, r, t, b) in [(0, 0, 0, 0), (1, 2, 3, 0), (4, 0, 0, 5), (2, 3, 1, 1)] {
            let out = crop(&grid(7, 6), l, r, t, b).unwrap();
            assert_eq!(out.width(), 7 - l - r);
            assert_eq!(out.height(), 6 - t - b);
            assert_eq!(out.get(0, 0), [l as u8, t as u8, 0]);
        }
    }

    #[test]
    fn test_crop_zero_margins_is_identity() {
        let buffer = grid(3, 2);
        assert_eq!(crop(&buffer, 0, 0, 0, 0).unwrap(), buffer);
    }

    #[test]
    fn test_crop_consuming_axis_rejected() {
        let buffer = grid(2, 2);
        assert!(matches!(
            crop(&buffer, 1, 1, 0, 0),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            crop(&buffer, 0, 0, 0, 3),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(crop(&buffer, u32::MAX, u32::MAX, 0, 0).is_err());
    }
}
